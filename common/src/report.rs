//! Turns a dispatch tally into the terminal copy shown to the manager.

use crate::model::batch::BatchResult;
use serde::{Deserialize, Serialize};

/// Payload handed to the hosting screen once a dispatch completes, so it can
/// refresh its invitation statistics and onboarding checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub sent_count: u32,
    pub saved_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReport {
    pub result: BatchResult,
    pub headline: String,
}

impl ResultReport {
    pub fn completion(&self) -> Completion {
        Completion {
            sent_count: self.result.emails_sent,
            saved_count: self.result.total_saved,
        }
    }
}

impl From<&BatchResult> for ResultReport {
    fn from(result: &BatchResult) -> Self {
        Self {
            result: *result,
            headline: headline(result),
        }
    }
}

fn plural(n: u32, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

fn headline(result: &BatchResult) -> String {
    if result.is_roster {
        return format!(
            "Added {} to the building roster.",
            plural(result.total_saved, "resident", "residents")
        );
    }

    let attempted = result.emails_sent + result.emails_failed;
    if attempted == 0 {
        return format!(
            "Saved {}. No invitations were sent.",
            plural(result.total_saved, "resident", "residents")
        );
    }

    let mut text = format!(
        "Sent {}",
        plural(result.emails_sent, "invitation", "invitations")
    );
    if result.emails_failed > 0 {
        text.push_str(&format!(", {} failed", result.emails_failed));
    }
    if result.saved_without_email > 0 {
        text.push_str(&format!(
            ". Saved {} without an email address",
            plural(result.saved_without_email, "resident", "residents")
        ));
    }
    text.push('.');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_headline() {
        let report = ResultReport::from(&BatchResult {
            total_saved: 4,
            is_roster: true,
            ..Default::default()
        });
        assert_eq!(report.headline, "Added 4 residents to the building roster.");
        assert_eq!(report.completion(), Completion { sent_count: 0, saved_count: 4 });
    }

    #[test]
    fn invite_headline_mentions_failures_and_unaddressed() {
        let report = ResultReport::from(&BatchResult {
            total_saved: 3,
            emails_sent: 1,
            emails_failed: 1,
            saved_without_email: 1,
            is_roster: false,
        });
        assert_eq!(
            report.headline,
            "Sent 1 invitation, 1 failed. Saved 1 resident without an email address."
        );
        assert_eq!(report.completion(), Completion { sent_count: 1, saved_count: 3 });
    }

    #[test]
    fn save_only_headline() {
        let report = ResultReport::from(&BatchResult {
            total_saved: 2,
            saved_without_email: 1,
            ..Default::default()
        });
        assert_eq!(report.headline, "Saved 2 residents. No invitations were sent.");
    }
}
