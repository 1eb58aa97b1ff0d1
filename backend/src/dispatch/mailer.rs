//! Invitation mail collaborator.

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Mail service rejected {email}: {reason}")]
    Rejected { email: String, reason: String },

    #[error("Invalid invitation link: {0}")]
    InvalidLink(String),

    #[error("Mail delivery is not configured")]
    NotConfigured,
}

/// Everything needed to write one invitation.
#[derive(Debug, Clone, Serialize)]
pub struct Invite<'a> {
    pub to: &'a str,
    pub name: &'a str,
    pub unit: &'a str,
    pub building_id: &'a str,
    pub building_name: &'a str,
    pub invited_by: &'a str,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_invite(&self, invite: &Invite<'_>) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct MailBody<'a> {
    #[serde(flatten)]
    invite: &'a Invite<'a>,
    subject: String,
    link: String,
}

/// Posts invitations to a transactional mail endpoint.
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    app_url: String,
}

impl HttpMailer {
    pub fn new(url: impl Into<String>, app_url: impl Into<String>) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            app_url: app_url.into(),
        })
    }

    /// Sign-up link carrying the building and the invited address.
    pub fn signup_link(&self, invite: &Invite<'_>) -> Result<Url, MailError> {
        let base = format!("{}/join", self.app_url.trim_end_matches('/'));
        Url::parse_with_params(&base, &[("building", invite.building_id), ("email", invite.to)])
            .map_err(|e| MailError::InvalidLink(e.to_string()))
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_invite(&self, invite: &Invite<'_>) -> Result<(), MailError> {
        let body = MailBody {
            invite,
            subject: format!("You're invited to join {}", invite.building_name),
            link: self.signup_link(invite)?.to_string(),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let reason = response.text().await.unwrap_or_default();
            Err(MailError::Rejected {
                email: invite.to.to_string(),
                reason: if reason.trim().is_empty() {
                    status.to_string()
                } else {
                    reason
                },
            })
        }
    }
}

/// Rejects every invitation. Stands in when no mail endpoint is configured
/// so nothing is recorded as sent.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_invite(&self, _invite: &Invite<'_>) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

/// Most recent addresses kept by [`InMemoryMailer`].
pub const SENT_LOG_LIMIT: usize = 500;

/// Records invitations instead of sending them. Used in demo mode and tests.
///
/// Addresses registered with [`InMemoryMailer::failing_for`] are rejected.
#[derive(Default)]
pub struct InMemoryMailer {
    sent: Mutex<VecDeque<String>>,
    failing: HashSet<String>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sent: Mutex::new(VecDeque::new()),
            failing: addresses.into_iter().map(Into::into).collect(),
        }
    }

    /// Addresses that were sent an invitation, oldest first, capped at
    /// [`SENT_LOG_LIMIT`].
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send_invite(&self, invite: &Invite<'_>) -> Result<(), MailError> {
        if self.failing.contains(invite.to) {
            return Err(MailError::Rejected {
                email: invite.to.to_string(),
                reason: "mailbox unavailable".into(),
            });
        }
        let mut log = self
            .sent
            .lock()
            .map_err(|_| MailError::Network("in-memory mailer poisoned".into()))?;
        if log.len() == SENT_LOG_LIMIT {
            log.pop_front();
        }
        log.push_back(invite.to.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite<'a>(to: &'a str) -> Invite<'a> {
        Invite {
            to,
            name: "Ann Lee",
            unit: "4B",
            building_id: "b 1",
            building_name: "Maple Court",
            invited_by: "manager-1",
        }
    }

    #[test]
    fn signup_link_encodes_parameters() {
        let mailer = HttpMailer::new("http://mail.invalid/send", "https://app.example.com/").unwrap();
        let link = mailer.signup_link(&invite("ann+home@x.com")).unwrap();
        assert_eq!(
            link.as_str(),
            "https://app.example.com/join?building=b+1&email=ann%2Bhome%40x.com"
        );
    }

    #[tokio::test]
    async fn in_memory_mailer_rejects_configured_addresses() {
        let mailer = InMemoryMailer::failing_for(["bad@x.com"]);
        assert!(mailer.send_invite(&invite("ann@x.com")).await.is_ok());
        assert!(matches!(
            mailer.send_invite(&invite("bad@x.com")).await,
            Err(MailError::Rejected { .. })
        ));
        assert_eq!(mailer.sent(), ["ann@x.com"]);
    }

    #[tokio::test]
    async fn in_memory_mailer_keeps_only_recent_addresses() {
        let mailer = InMemoryMailer::new();
        let addresses: Vec<String> = (0..=SENT_LOG_LIMIT).map(|i| format!("r{}@x.com", i)).collect();
        for address in &addresses {
            mailer.send_invite(&invite(address)).await.unwrap();
        }

        let sent = mailer.sent();
        assert_eq!(sent.len(), SENT_LOG_LIMIT);
        assert_eq!(sent.first().map(String::as_str), Some("r1@x.com"));
        assert_eq!(sent.last(), addresses.last());
    }

    #[tokio::test]
    async fn disabled_mailer_never_delivers() {
        assert!(matches!(
            DisabledMailer.send_invite(&invite("ann@x.com")).await,
            Err(MailError::NotConfigured)
        ));
    }
}
