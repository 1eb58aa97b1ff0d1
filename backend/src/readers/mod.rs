//! Source readers: turn an uploaded file into mapped resident rows.
//!
//! Both readers reduce their input to a header row plus data rows of plain
//! strings and share [`map_table`], which decides between
//! `IngestOutcome::MappedRows` and `IngestOutcome::NeedsFreeTextInterpretation`.
//!
//! A table needs free-text interpretation when:
//! - no header maps to a name or an email column,
//! - no header maps to an email column but some cell contains an address
//!   (the address is buried in a notes/contact column), or
//! - an email column exists but none of its cells holds an address.

pub mod delimited;
pub mod headers;
pub mod spreadsheet;

use common::error::ImportError;
use common::model::columns::{ColumnMapping, ColumnRole};
use common::model::ingest::IngestOutcome;
use common::model::resident::ParsedResident;
use regex::Regex;
use std::path::Path;

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+'\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}";

/// File kinds accepted by [`read_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Delimited,
    Spreadsheet,
}

impl SourceKind {
    /// Identifies the reader from the file extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, ImportError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(SourceKind::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceKind::Spreadsheet),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

/// Reads an uploaded file by extension.
pub fn read_source(filename: &str, bytes: &[u8]) -> Result<IngestOutcome, ImportError> {
    match SourceKind::from_filename(filename)? {
        SourceKind::Delimited => delimited::read(filename, bytes),
        SourceKind::Spreadsheet => spreadsheet::read(bytes),
    }
}

fn email_regex() -> Result<Regex, ImportError> {
    Regex::new(EMAIL_PATTERN).map_err(|e| ImportError::Malformed(format!("Regex error: {}", e)))
}

/// Assigns a role to every header. When two headers claim the same role the
/// leftmost wins and the other column is ignored.
fn assign_roles(headers: &[String]) -> Vec<Option<ColumnRole>> {
    let mut taken: Vec<ColumnRole> = Vec::new();
    headers
        .iter()
        .map(|h| match headers::classify(h) {
            Some(role) if !taken.contains(&role) => {
                taken.push(role);
                Some(role)
            }
            _ => None,
        })
        .collect()
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Flattens the table back into text for the organizer.
fn render_raw_text(headers: &[String], rows: &[Vec<String>]) -> String {
    std::iter::once(headers)
        .chain(rows.iter().map(Vec::as_slice))
        .filter(|row| !is_blank_row(row))
        .map(|row| {
            row.iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Maps a header row and its data rows onto resident fields.
pub fn map_table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<IngestOutcome, ImportError> {
    let rows: Vec<Vec<String>> = rows.into_iter().filter(|r| !is_blank_row(r)).collect();
    if rows.is_empty() && is_blank_row(&headers) {
        return Err(ImportError::EmptyResult);
    }

    let roles = assign_roles(&headers);
    let column = |role: ColumnRole| roles.iter().position(|r| *r == Some(role));
    let name_col = column(ColumnRole::Name);
    let first_col = column(ColumnRole::FirstName);
    let last_col = column(ColumnRole::LastName);
    let email_col = column(ColumnRole::Email);
    let unit_col = column(ColumnRole::Unit);
    let phone_col = column(ColumnRole::Phone);

    let needs_interpretation = || IngestOutcome::NeedsFreeTextInterpretation {
        raw_text: render_raw_text(&headers, &rows),
    };

    let has_name = name_col.is_some() || first_col.is_some() || last_col.is_some();
    if !has_name && email_col.is_none() {
        return Ok(needs_interpretation());
    }

    let email_re = email_regex()?;
    let Some(email_col) = email_col else {
        let buried = rows.iter().flatten().any(|c| email_re.is_match(c));
        return if buried {
            Ok(needs_interpretation())
        } else {
            build_outcome(&headers, &roles, &rows, |row| ParsedResident {
                name: row_name(row, name_col, first_col, last_col),
                email: String::new(),
                unit: cell(row, unit_col),
                phone: cell(row, phone_col),
            })
        };
    };

    let addresses: Vec<String> = rows
        .iter()
        .map(|row| {
            email_re
                .find(&cell(row, Some(email_col)))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .collect();
    if !rows.is_empty() && addresses.iter().all(String::is_empty) {
        return Ok(needs_interpretation());
    }

    let mut addresses = addresses.into_iter();
    build_outcome(&headers, &roles, &rows, |row| ParsedResident {
        name: row_name(row, name_col, first_col, last_col),
        email: addresses.next().unwrap_or_default(),
        unit: cell(row, unit_col),
        phone: cell(row, phone_col),
    })
}

fn build_outcome<F>(
    headers: &[String],
    roles: &[Option<ColumnRole>],
    rows: &[Vec<String>],
    to_resident: F,
) -> Result<IngestOutcome, ImportError>
where
    F: FnMut(&Vec<String>) -> ParsedResident,
{
    let residents: Vec<ParsedResident> = rows
        .iter()
        .map(to_resident)
        .map(ParsedResident::normalized)
        .filter(|r| !r.is_blank())
        .collect();
    if residents.is_empty() {
        return Err(ImportError::EmptyResult);
    }

    let columns = headers
        .iter()
        .zip(roles)
        .enumerate()
        .map(|(i, (title, role))| ColumnMapping {
            title: title.trim().to_string(),
            role: *role,
            first_row: rows.first().and_then(|r| r.get(i)).map(|v| v.trim().to_string()),
        })
        .collect();

    Ok(IngestOutcome::MappedRows { residents, columns })
}

fn cell(row: &[String], col: Option<usize>) -> String {
    col.and_then(|i| row.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn row_name(row: &[String], name: Option<usize>, first: Option<usize>, last: Option<usize>) -> String {
    let full = cell(row, name);
    if !full.is_empty() {
        return full;
    }
    [cell(row, first), cell(row, last)]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
