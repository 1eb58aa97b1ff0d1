//! Component state for the resident importer.
//!
//! The staging logic itself lives in `common::session::ImporterSession`; this
//! struct adds what only the browser needs: DOM refs, the in-flight request
//! flag, the header interpretation of the last upload and the id of the
//! dispatch job being polled.

use common::model::columns::ColumnMapping;
use common::session::ImporterSession;
use yew::prelude::*;

/// Delay between two status polls, in milliseconds.
pub const POLL_INTERVAL_MS: u32 = 400;

/// Longest delay between polls while the backend cannot be reached.
pub const MAX_POLL_INTERVAL_MS: u32 = 10_000;

/// Delay before the next poll after `failures` consecutive failed ones,
/// doubling from [`POLL_INTERVAL_MS`] up to [`MAX_POLL_INTERVAL_MS`].
pub fn poll_delay_ms(failures: u8) -> u32 {
    POLL_INTERVAL_MS
        .checked_shl(u32::from(failures))
        .map_or(MAX_POLL_INTERVAL_MS, |delay| delay.min(MAX_POLL_INTERVAL_MS))
}

pub struct ResidentImporter {
    pub session: ImporterSession,

    /// Hidden `<input type="file">` opened by the upload button.
    pub file_input_ref: NodeRef,

    /// A parse request (upload or organize) is waiting for the backend.
    pub parsing: bool,

    /// Header interpretation of the last upload. Empty for free text.
    pub columns: Vec<ColumnMapping>,

    /// The last upload went through the organizer.
    pub interpreted: bool,

    /// Dispatch job being polled, while `sending`.
    pub job_id: Option<String>,

    /// Consecutive failed status polls. The job keeps running server side,
    /// so these never end the dispatch.
    pub poll_failures: u8,
}

impl ResidentImporter {
    pub fn new() -> Self {
        Self {
            session: ImporterSession::new(),
            file_input_ref: NodeRef::default(),
            parsing: false,
            columns: Vec::new(),
            interpreted: false,
            job_id: None,
            poll_failures: 0,
        }
    }

    /// Forgets everything tied to the previous import.
    pub fn clear_import(&mut self) {
        self.parsing = false;
        self.columns.clear();
        self.interpreted = false;
        self.job_id = None;
        self.poll_failures = 0;
    }

    /// The last status poll failed while a job is still being followed.
    pub fn connection_lost(&self) -> bool {
        self.job_id.is_some() && self.poll_failures > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_delay_backs_off_and_caps() {
        assert_eq!(poll_delay_ms(0), POLL_INTERVAL_MS);
        assert_eq!(poll_delay_ms(1), 800);
        assert_eq!(poll_delay_ms(3), 3_200);
        assert_eq!(poll_delay_ms(5), MAX_POLL_INTERVAL_MS);
        assert_eq!(poll_delay_ms(u8::MAX), MAX_POLL_INTERVAL_MS);
    }

    #[test]
    fn failed_polls_only_mark_the_connection_lost() {
        let mut importer = ResidentImporter::new();
        importer.poll_failures = 4;
        assert!(!importer.connection_lost());

        importer.job_id = Some("job-1".into());
        assert!(importer.connection_lost());

        importer.clear_import();
        assert!(!importer.connection_lost());
    }
}
