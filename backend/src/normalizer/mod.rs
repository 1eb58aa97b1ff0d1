//! Free-text normalizer.
//!
//! Unstructured input (pasted lines, exported address books, tables whose
//! headers could not be mapped) is handed to an external organizer in a single
//! call. This module only shapes the organizer's answer into resident rows and
//! maps its failures onto the import error taxonomy.

mod heuristic;
mod http;

pub use heuristic::HeuristicOrganizer;
pub use http::HttpOrganizer;

use async_trait::async_trait;
use common::error::ImportError;
use common::model::resident::ParsedResident;
use log::{info, warn};
use thiserror::Error;

/// Organizer client errors
#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("Network error: {0}")]
    Network(String),

    /// The organizer answered with an error message of its own.
    #[error("Organizer error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl OrganizerError {
    /// The message to show the user, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            OrganizerError::Network(m) | OrganizerError::Api(m) | OrganizerError::Parse(m) => m,
        }
    }
}

/// Turns arbitrary text into resident rows.
#[async_trait]
pub trait Organizer: Send + Sync {
    async fn organize(&self, raw_text: &str) -> Result<Vec<ParsedResident>, OrganizerError>;
}

/// Calls `organizer` once with the full text and returns the normalized,
/// non-blank rows it produced.
pub async fn normalize_free_text(
    organizer: &dyn Organizer,
    raw_text: &str,
) -> Result<Vec<ParsedResident>, ImportError> {
    if raw_text.trim().is_empty() {
        return Err(ImportError::EmptyResult);
    }

    let rows = organizer.organize(raw_text).await.map_err(|e| {
        warn!("organizer failed: {}", e);
        ImportError::upstream(Some(e.message()))
    })?;

    let rows: Vec<ParsedResident> = rows
        .into_iter()
        .map(ParsedResident::normalized)
        .filter(|r| !r.is_blank())
        .collect();
    if rows.is_empty() {
        return Err(ImportError::EmptyResult);
    }

    info!("organizer returned {} residents", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: fn() -> Result<Vec<ParsedResident>, OrganizerError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(reply: fn() -> Result<Vec<ParsedResident>, OrganizerError>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Organizer for Scripted {
        async fn organize(&self, _raw_text: &str) -> Result<Vec<ParsedResident>, OrganizerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }
    }

    #[tokio::test]
    async fn normalizes_organizer_output_with_one_call() {
        let organizer = Scripted::new(|| {
            Ok(vec![
                ParsedResident {
                    name: " Ann  Lee ".into(),
                    email: "ANN@X.COM ".into(),
                    unit: "4B".into(),
                    phone: String::new(),
                },
                ParsedResident::default(),
            ])
        });
        let rows = normalize_free_text(&organizer, "Ann Lee 4B ANN@X.COM").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ann Lee");
        assert_eq!(rows[0].email, "ann@x.com");
        assert_eq!(organizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_records_is_empty_result() {
        let organizer = Scripted::new(|| Ok(vec![]));
        let err = normalize_free_text(&organizer, "hello").await.unwrap_err();
        assert_eq!(err, ImportError::EmptyResult);
    }

    #[tokio::test]
    async fn blank_text_never_reaches_the_organizer() {
        let organizer = Scripted::new(|| Ok(vec![]));
        let err = normalize_free_text(&organizer, "  \n ").await.unwrap_err();
        assert_eq!(err, ImportError::EmptyResult);
        assert_eq!(organizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upstream_message_is_surfaced_verbatim() {
        let organizer = Scripted::new(|| Err(OrganizerError::Api("Daily quota reached".into())));
        let err = normalize_free_text(&organizer, "Ann").await.unwrap_err();
        assert_eq!(err, ImportError::Upstream("Daily quota reached".into()));
    }

    #[tokio::test]
    async fn empty_upstream_message_falls_back() {
        let organizer = Scripted::new(|| Err(OrganizerError::Network(String::new())));
        let err = normalize_free_text(&organizer, "Ann").await.unwrap_err();
        assert_eq!(err, ImportError::upstream(None));
    }
}
