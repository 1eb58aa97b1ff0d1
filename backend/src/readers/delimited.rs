//! Delimited text tables (`.csv`, `.tsv`, `.txt`).

use super::map_table;
use common::error::ImportError;
use common::model::ingest::IngestOutcome;

/// Picks the delimiter that occurs most often in the header line.
///
/// Falls back to `,` when the line contains none of the candidates, which
/// yields a single-column table.
pub fn detect_delimiter(header_line: &str) -> char {
    [',', ';', '\t', '|']
        .iter()
        .copied()
        .filter(|d| header_line.contains(*d))
        .max_by_key(|d| header_line.matches(*d).count())
        .unwrap_or(',')
}

/// Decodes the file as UTF-8 and strips a leading BOM. Other encodings are
/// rejected rather than guessed.
fn decode(bytes: &[u8]) -> Result<&str, ImportError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        ImportError::Malformed(format!(
            "the file is not UTF-8 text (invalid byte at position {}). Save it as \"CSV UTF-8\" and try again",
            e.valid_up_to()
        ))
    })?;
    Ok(text.trim_start_matches('\u{feff}'))
}

pub fn read(filename: &str, bytes: &[u8]) -> Result<IngestOutcome, ImportError> {
    let text = decode(bytes)?;
    if text.trim().is_empty() {
        return Err(ImportError::EmptyResult);
    }

    let header_line = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default();
    let delimiter = if filename.to_lowercase().ends_with(".tsv") {
        '\t'
    } else {
        detect_delimiter(header_line)
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut table: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Malformed(e.to_string()))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if table.is_empty() && row.iter().all(|c| c.is_empty()) {
            continue;
        }
        table.push(row);
    }

    let mut rows = table.into_iter();
    let headers = rows.next().ok_or(ImportError::EmptyResult)?;
    map_table(headers, rows.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_the_dominant_delimiter() {
        assert_eq!(detect_delimiter("name;email;unit"), ';');
        assert_eq!(detect_delimiter("name\temail"), '\t');
        assert_eq!(detect_delimiter("a|b|c,d"), '|');
        assert_eq!(detect_delimiter("just text"), ',');
    }

    #[test]
    fn reads_semicolon_export_with_bom_and_quotes() {
        let data = "\u{feff}Name;Email;Apt #;Phone\r\n\"Lee, Ann\";ANN@x.com;4B;555-0101\r\n;;;\r\nBob Roy;bob@x.com;7;\r\n";
        match read("export.csv", data.as_bytes()).unwrap() {
            IngestOutcome::MappedRows { residents, columns } => {
                assert_eq!(residents.len(), 2);
                assert_eq!(residents[0].name, "Lee, Ann");
                assert_eq!(residents[0].email, "ann@x.com");
                assert_eq!(residents[1].unit, "7");
                assert_eq!(columns.len(), 4);
                assert_eq!(columns[0].title, "Name");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn tab_separated_by_extension() {
        let data = "email\tunit\nann@x.com\t1, rear\n";
        match read("list.tsv", data.as_bytes()).unwrap() {
            IngestOutcome::MappedRows { residents, .. } => {
                assert_eq!(residents[0].unit, "1, rear");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn free_form_text_file_needs_interpretation() {
        let data = "Ann Lee, unit 4B, ann@x.com\nBob in 7 - bob@x.com\n";
        let outcome = read("notes.txt", data.as_bytes()).unwrap();
        assert!(matches!(outcome, IngestOutcome::NeedsFreeTextInterpretation { .. }));
    }

    #[test]
    fn non_utf8_bytes_are_malformed() {
        let err = read("export.csv", b"Name,Email\nJos\xE9 Ruiz,jose@x.com\n").unwrap_err();
        assert!(matches!(err, ImportError::Malformed(ref m) if m.contains("position 14")));
    }

    #[test]
    fn blank_file_is_empty() {
        assert_eq!(read("x.csv", b" \n\n").unwrap_err(), ImportError::EmptyResult);
    }
}
