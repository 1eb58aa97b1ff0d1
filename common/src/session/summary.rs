use crate::model::resident::CandidateRecord;
use serde::{Deserialize, Serialize};

/// Live counts shown above the review table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingSummary {
    /// Selected and addressed: will receive an invitation.
    pub ready_count: usize,
    /// Records without an address, selected or not.
    ///
    /// Counted regardless of selection so the warning stays visible even for
    /// rows the manager unticked. Whether it should only count selected rows
    /// is an open product question; keep this behaviour until it is settled.
    pub no_email_count: usize,
    pub selected_count: usize,
    pub total: usize,
}

impl StagingSummary {
    pub fn of(records: &[CandidateRecord]) -> Self {
        records.iter().fold(
            StagingSummary {
                total: records.len(),
                ..Default::default()
            },
            |mut acc, r| {
                if r.selected {
                    acc.selected_count += 1;
                    if r.has_email() {
                        acc.ready_count += 1;
                    }
                }
                if !r.has_email() {
                    acc.no_email_count += 1;
                }
                acc
            },
        )
    }
}
