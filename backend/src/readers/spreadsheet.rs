//! Spreadsheet workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`).
//!
//! Only the first worksheet is read. Leading blank rows are skipped so a
//! title row left empty above the headers does not break mapping.

use super::map_table;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use common::error::ImportError;
use common::model::ingest::IngestOutcome;
use std::io::Cursor;

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        // phone numbers and unit numbers typed as numbers come back as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

pub fn read(bytes: &[u8]) -> Result<IngestOutcome, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Malformed(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptyResult)?
        .map_err(|e| ImportError::Malformed(e.to_string()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<String>>())
        .skip_while(|row| row.iter().all(|c| c.trim().is_empty()));

    let headers = rows.next().ok_or(ImportError::EmptyResult)?;
    map_table(headers, rows.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESIDENTS_XLSX: &[u8] = include_bytes!("../../tests/fixtures/residents.xlsx");

    #[test]
    fn reads_first_sheet() {
        match read(RESIDENTS_XLSX).unwrap() {
            IngestOutcome::MappedRows { residents, columns } => {
                assert_eq!(residents.len(), 2);
                assert_eq!(residents[0].name, "Ann Lee");
                assert_eq!(residents[0].email, "ann@x.com");
                assert_eq!(residents[0].unit, "4B");
                assert_eq!(residents[1].name, "Bob Roy");
                assert_eq!(residents[1].unit, "12");
                assert_eq!(residents[1].phone, "5550102");
                assert_eq!(columns.len(), 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn integral_floats_lose_the_fraction() {
        assert_eq!(cell_to_string(&Data::Float(12.0)), "12");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = read(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, ImportError::Malformed(_)));
    }
}
