//! HTTP payloads shared by the frontend and the backend.

use crate::model::batch::DispatchMode;
use crate::model::columns::ColumnMapping;
use crate::model::resident::ParsedResident;
use serde::{Deserialize, Serialize};

/// Capability handed to the dispatcher: who is importing, into which building.
///
/// Passed explicitly with every dispatch instead of being read from any
/// app-wide session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterContext {
    pub building_id: String,
    pub actor_id: String,
    pub building_name: String,
}

/// Request payload for the free-text organize endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeRequest {
    pub text: String,
}

/// Request payload for the quick-add endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickAddRequest {
    pub emails: String,
}

/// Residents produced by a parse step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentsResponse {
    pub residents: Vec<ParsedResident>,
}

/// Response to a file upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub residents: Vec<ParsedResident>,
    /// Header interpretation; empty when the file went through the organizer.
    pub columns: Vec<ColumnMapping>,
    /// True when headers could not be mapped and the organizer read the file.
    pub interpreted: bool,
}

/// Request payload to start a dispatch job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub context: ImporterContext,
    pub mode: DispatchMode,
    pub residents: Vec<ParsedResident>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchStarted {
    pub job_id: String,
}
