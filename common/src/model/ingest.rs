use crate::model::columns::ColumnMapping;
use crate::model::resident::ParsedResident;
use serde::{Deserialize, Serialize};

/// Result of reading an uploaded source.
///
/// Readers never hand back loosely-typed rows: either the headers mapped and
/// the residents are ready, or the raw text must go through the organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestOutcome {
    MappedRows {
        residents: Vec<ParsedResident>,
        columns: Vec<ColumnMapping>,
    },
    NeedsFreeTextInterpretation {
        raw_text: String,
    },
}
