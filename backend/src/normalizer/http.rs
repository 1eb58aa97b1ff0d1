use super::{Organizer, OrganizerError};
use async_trait::async_trait;
use common::model::resident::ParsedResident;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct OrganizeBody<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct OrganizeReply {
    #[serde(default)]
    residents: Vec<ParsedResident>,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

/// Organizer reached over HTTP.
///
/// Sends `{ "text": ... }` and expects `{ "residents": [...] }`, or
/// `{ "error": "..." }` with a non-success status.
pub struct HttpOrganizer {
    client: reqwest::Client,
    url: String,
}

impl HttpOrganizer {
    pub fn new(url: impl Into<String>) -> Result<Self, OrganizerError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OrganizerError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Organizer for HttpOrganizer {
    async fn organize(&self, raw_text: &str) -> Result<Vec<ParsedResident>, OrganizerError> {
        let response = self
            .client
            .post(&self.url)
            .json(&OrganizeBody { text: raw_text })
            .send()
            .await
            .map_err(|e| OrganizerError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| OrganizerError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorReply>(&body)
                .map(|r| r.error)
                .unwrap_or_default();
            return Err(OrganizerError::Api(message));
        }

        serde_json::from_slice::<OrganizeReply>(&body)
            .map(|r| r.residents)
            .map_err(|e| OrganizerError::Parse(e.to_string()))
    }
}
