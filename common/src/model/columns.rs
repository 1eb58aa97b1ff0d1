use serde::{Deserialize, Serialize};

/// Resident field a source column was mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Name,
    FirstName,
    LastName,
    Email,
    Unit,
    Phone,
}

/// How one header of an uploaded table was interpreted.
///
/// Readers return one entry per header, in file order, alongside the mapped
/// rows. The frontend shows them so the manager can check that "Apt #" really
/// became the unit before sending anything.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ColumnMapping {
    /// The header cell as it appeared in the file, trimmed.
    pub title: String,
    /// `None` when the header matched no known field and the column is ignored.
    pub role: Option<ColumnRole>,
    /// Value of this column in the first data row, as a concrete example.
    pub first_row: Option<String>,
}
