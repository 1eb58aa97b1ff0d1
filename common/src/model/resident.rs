use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One resident row as produced by a reader, the organizer or quick-add,
/// before the staging session assigns it an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResident {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub phone: String,
}

impl ParsedResident {
    /// Trims every field and lower-cases the email.
    pub fn normalized(self) -> Self {
        Self {
            name: collapse_whitespace(&self.name),
            email: normalize_email(&self.email),
            unit: self.unit.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }

    /// A row with neither a name nor an email carries nothing to import.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.email.trim().is_empty()
    }

    fn dedupe_key(&self) -> Option<String> {
        if !self.email.is_empty() {
            Some(format!("email:{}", self.email))
        } else if !self.name.is_empty() {
            Some(format!("name:{}|{}", self.name.to_lowercase(), self.unit.to_lowercase()))
        } else {
            None
        }
    }

    fn fill_missing_from(&mut self, other: &ParsedResident) {
        for (mine, theirs) in [
            (&mut self.name, &other.name),
            (&mut self.unit, &other.unit),
            (&mut self.phone, &other.phone),
        ] {
            if mine.is_empty() && !theirs.is_empty() {
                *mine = theirs.clone();
            }
        }
    }
}

/// A staged resident under review.
///
/// `has_email` is private so it can only change through [`CandidateRecord::set_email`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub unit: String,
    pub phone: String,
    pub selected: bool,
    has_email: bool,
}

impl CandidateRecord {
    pub fn new(id: u64, parsed: ParsedResident) -> Self {
        let parsed = parsed.normalized();
        let has_email = !parsed.email.trim().is_empty();
        Self {
            id,
            name: parsed.name,
            email: parsed.email,
            unit: parsed.unit,
            phone: parsed.phone,
            selected: true,
            has_email,
        }
    }

    pub fn has_email(&self) -> bool {
        self.has_email
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = normalize_email(email);
        self.has_email = !self.email.trim().is_empty();
    }

    /// Overwrites the editable fields from a draft.
    pub fn apply(&mut self, values: &RecordValues) {
        self.name = collapse_whitespace(&values.name);
        self.unit = values.unit.trim().to_string();
        self.phone = values.phone.trim().to_string();
        self.set_email(&values.email);
    }

    pub fn values(&self) -> RecordValues {
        RecordValues {
            name: self.name.clone(),
            email: self.email.clone(),
            unit: self.unit.clone(),
            phone: self.phone.clone(),
        }
    }

    /// The id-less payload sent to the dispatcher.
    pub fn to_parsed(&self) -> ParsedResident {
        ParsedResident {
            name: self.name.clone(),
            email: self.email.clone(),
            unit: self.unit.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Editable fields of a record, used as the inline-edit draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValues {
    pub name: String,
    pub email: String,
    pub unit: String,
    pub phone: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose address check used by readers to decide whether a column really
/// holds emails.
pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes rows and merges duplicates.
///
/// Rows are keyed by email, or by name and unit when no email is present. The
/// first occurrence keeps its position; later duplicates only fill its empty
/// fields. Blank rows are dropped.
pub fn dedupe(rows: Vec<ParsedResident>) -> Vec<ParsedResident> {
    let mut out: Vec<ParsedResident> = Vec::with_capacity(rows.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for row in rows.into_iter().map(ParsedResident::normalized) {
        let Some(key) = row.dedupe_key() else {
            continue;
        };
        match seen.get(&key) {
            Some(&idx) => out[idx].fill_missing_from(&row),
            None => {
                seen.insert(key, out.len());
                out.push(row);
            }
        }
    }
    out
}
