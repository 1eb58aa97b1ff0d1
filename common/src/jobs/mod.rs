use crate::model::batch::BatchResult;
use serde::{Deserialize, Serialize};

/// Status of a background dispatch job, as polled by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// `sent` attempted invitations out of `total` addressed records.
    InProgress { sent: u32, total: u32 },
    Completed(BatchResult),
    /// The whole batch failed; carries the user-facing message.
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}
