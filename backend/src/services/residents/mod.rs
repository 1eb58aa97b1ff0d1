//! HTTP API of the resident importer.
//!
//! Routes, all under `/api/residents`:
//! - `POST /upload`: multipart form with a `file` field (CSV, TSV, TXT or a
//!   workbook). Mapped rows come back as-is; tables whose headers cannot be
//!   mapped go through the organizer and come back with `interpreted: true`.
//! - `POST /organize`: `{ "text": ... }`, free text through the organizer.
//! - `POST /quick-add`: `{ "emails": ... }`, a local split of pasted addresses.
//! - `POST /dispatch`: starts a background dispatch job and returns its id.
//! - `GET /dispatch/status/{job_id}`: current `JobStatus` of that job.
//!
//! Errors use the JSON body described in `crate::error`.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod dispatch;
mod get_status;
mod organize;
mod quick_add;
mod upload;

#[cfg(test)]
mod tests;

const API_PATH: &str = "/api/residents";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload", post().to(upload::process))
        .route("/organize", post().to(organize::process))
        .route("/quick-add", post().to(quick_add::process))
        .route("/dispatch", post().to(dispatch::process))
        .route("/dispatch/status/{job_id}", get().to(get_status::process))
}
