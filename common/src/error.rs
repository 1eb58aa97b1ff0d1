use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback shown when an upstream collaborator fails without a usable message.
pub const UPSTREAM_FALLBACK: &str = "Something went wrong while processing your residents. Please try again.";

/// Errors raised while ingesting, staging or dispatching residents.
///
/// Every variant renders as an inline, dismissible message. `EmptyResult` and
/// `Upstream` intentionally read differently so a user can tell "nothing was
/// found" apart from "the service failed".
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ImportError {
    /// The uploaded file extension is not a delimited table or workbook.
    #[error("Unsupported file type '.{0}'. Upload a CSV or spreadsheet file.")]
    UnsupportedFormat(String),

    /// A parse attempt produced zero candidate records.
    #[error("No residents found. Try a different format.")]
    EmptyResult,

    /// The organizer, store or mailer failed. Carries the upstream message.
    #[error("{0}")]
    Upstream(String),

    /// The file could be identified but not read.
    #[error("Could not read file: {0}")]
    Malformed(String),

    /// A dispatch was requested with no record selected.
    #[error("Select at least one resident first.")]
    NothingSelected,

    /// The staging session is not in a phase that allows the action.
    #[error("Cannot {action} while {phase}.")]
    InvalidPhase { action: String, phase: String },
}

impl ImportError {
    /// Builds an `Upstream` error, falling back to a generic message when the
    /// collaborator gave nothing useful.
    pub fn upstream(message: Option<&str>) -> Self {
        match message.map(str::trim) {
            Some(msg) if !msg.is_empty() => ImportError::Upstream(msg.to_string()),
            _ => ImportError::Upstream(UPSTREAM_FALLBACK.to_string()),
        }
    }

    /// Short machine-readable kind, used as the `code` in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ImportError::EmptyResult => "EMPTY_RESULT",
            ImportError::Upstream(_) => "UPSTREAM_ERROR",
            ImportError::Malformed(_) => "MALFORMED",
            ImportError::NothingSelected => "NOTHING_SELECTED",
            ImportError::InvalidPhase { .. } => "INVALID_PHASE",
        }
    }
}
