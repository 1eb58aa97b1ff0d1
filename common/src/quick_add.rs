//! Quick-add: turn a pasted list of email addresses into residents.
//!
//! This path is local and deterministic. It never calls the organizer, so it
//! stays instant even when the network is slow.

use crate::model::resident::{ParsedResident, normalize_email};

/// Splits `input` on commas, semicolons and newlines and builds one resident
/// per non-empty address, deriving the display name from the local part.
pub fn parse_email_list(input: &str) -> Vec<ParsedResident> {
    input
        .split([',', ';', '\n', '\r'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|address| ParsedResident {
            name: name_from_email(address),
            email: normalize_email(address),
            unit: String::new(),
            phone: String::new(),
        })
        .collect()
}

/// `"jane_smith@x.com"` becomes `"Jane Smith"`.
pub fn name_from_email(address: &str) -> String {
    let local = address.split('@').next().unwrap_or_default();
    local
        .split(['.', '_', '-'])
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
