//! Server configuration, read from the environment (and a `.env` file when present).
//!
//! | variable                  | default              |
//! |---------------------------|----------------------|
//! | `IMPORTER_HOST`           | `127.0.0.1`          |
//! | `IMPORTER_PORT`           | `8080`               |
//! | `IMPORTER_DB_PATH`        | `residents.sqlite`   |
//! | `IMPORTER_ORGANIZER_URL`  | unset: local heuristic organizer |
//! | `IMPORTER_MAILER_URL`     | unset: in-memory mailer |
//! | `IMPORTER_APP_URL`        | `http://127.0.0.1:8080` |
//! | `IMPORTER_DEMO_MODE`      | `false`              |
//! | `IMPORTER_OPEN_BROWSER`   | `true`               |
//! | `IMPORTER_MAX_UPLOAD_MB`  | `10`                 |

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub organizer_url: Option<String>,
    pub mailer_url: Option<String>,
    /// Base URL of the web app, used to build sign-up links in invitations.
    pub app_url: String,
    /// Use in-memory collaborators for everything.
    pub demo_mode: bool,
    pub open_browser: bool,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // a missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("IMPORTER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match get("IMPORTER_PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "IMPORTER_PORT",
                value: v,
            })?,
            None => 8080,
        };
        let max_upload_mb: usize = match get("IMPORTER_MAX_UPLOAD_MB") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "IMPORTER_MAX_UPLOAD_MB",
                value: v,
            })?,
            None => 10,
        };

        Ok(Self {
            app_url: get("IMPORTER_APP_URL").unwrap_or_else(|| format!("http://{}:{}", host, port)),
            db_path: get("IMPORTER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("residents.sqlite")),
            organizer_url: get("IMPORTER_ORGANIZER_URL"),
            mailer_url: get("IMPORTER_MAILER_URL"),
            demo_mode: parse_flag("IMPORTER_DEMO_MODE", get("IMPORTER_DEMO_MODE"), false)?,
            open_browser: parse_flag("IMPORTER_OPEN_BROWSER", get("IMPORTER_OPEN_BROWSER"), true)?,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            host,
            port,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_flag(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::InvalidValue {
            key,
            value: value.unwrap_or_default(),
        }),
    }
}
