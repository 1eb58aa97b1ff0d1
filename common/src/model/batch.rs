use serde::{Deserialize, Serialize};

/// How a dispatch treats the selected records. Chosen by the hosting screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Persist every record and email an invitation to those with an address.
    #[default]
    Invite,
    /// Persist every record, send nothing.
    SaveOnly,
    /// Add every record to the building roster, send nothing.
    Roster,
}

/// Terminal tally of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Records durably persisted, regardless of email outcome.
    pub total_saved: u32,
    pub emails_sent: u32,
    pub emails_failed: u32,
    /// Persisted records that had no address and were never attempted.
    pub saved_without_email: u32,
    pub is_roster: bool,
}
