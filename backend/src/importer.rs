//! The collaborators an import needs, chosen once at startup from [`Config`].
//!
//! Demo mode swaps every external service for a local stand-in. Outside demo
//! mode a missing organizer URL falls back to the local organizer, and a
//! missing mailer URL makes every invitation fail so none is marked as sent.

use crate::config::Config;
use crate::dispatch::mailer::{DisabledMailer, HttpMailer, InMemoryMailer, MailError, Mailer};
use crate::dispatch::store::{InMemoryStore, ResidentStore, SqliteStore, StoreError};
use crate::dispatch::Dispatcher;
use crate::normalizer::{HeuristicOrganizer, HttpOrganizer, Organizer, OrganizerError};
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Organizer(#[from] OrganizerError),

    #[error(transparent)]
    Mailer(#[from] MailError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Shared, clonable handle injected into every handler as `web::Data`.
#[derive(Clone)]
pub struct ImportServices {
    pub organizer: Arc<dyn Organizer>,
    pub dispatcher: Dispatcher,
    pub max_upload_bytes: usize,
}

impl ImportServices {
    pub fn new(organizer: Arc<dyn Organizer>, dispatcher: Dispatcher, max_upload_bytes: usize) -> Self {
        Self {
            organizer,
            dispatcher,
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let store: Arc<dyn ResidentStore> = if config.demo_mode {
            info!("demo mode: residents are kept in memory");
            Arc::new(InMemoryStore::new())
        } else {
            info!("storing residents in {}", config.db_path.display());
            Arc::new(SqliteStore::open(&config.db_path)?)
        };

        let organizer: Arc<dyn Organizer> = match (&config.organizer_url, config.demo_mode) {
            (Some(url), false) => Arc::new(HttpOrganizer::new(url.as_str())?),
            (url, _) => {
                if url.is_none() && !config.demo_mode {
                    warn!("IMPORTER_ORGANIZER_URL not set, using the local organizer");
                }
                Arc::new(HeuristicOrganizer::new()?)
            }
        };

        let mailer: Arc<dyn Mailer> = match (&config.mailer_url, config.demo_mode) {
            (_, true) => Arc::new(InMemoryMailer::new()),
            (Some(url), false) => Arc::new(HttpMailer::new(url.as_str(), config.app_url.as_str())?),
            (None, false) => {
                warn!("IMPORTER_MAILER_URL not set, invitations will be reported as failed");
                Arc::new(DisabledMailer)
            }
        };

        Ok(Self::new(
            organizer,
            Dispatcher::new(store, mailer),
            config.max_upload_bytes,
        ))
    }

    /// Everything in memory. Used by handler tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(HeuristicOrganizer::new().expect("organizer patterns")),
            Dispatcher::new(Arc::new(InMemoryStore::new()), Arc::new(InMemoryMailer::new())),
            1024 * 1024,
        )
    }
}
