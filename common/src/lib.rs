//! Shared model for the resident importer.
//!
//! Everything in this crate is pure and synchronous so it can run both in the
//! browser (the Yew frontend drives the staging session directly) and on the
//! backend (readers, normalizer and dispatcher produce and consume the same
//! record types).

pub mod error;
pub mod jobs;
pub mod model;
pub mod quick_add;
pub mod report;
pub mod requests;
pub mod session;
