// File I/O: source tables in, report documents out

pub mod csv;
pub mod dates;
pub mod error;
pub mod money;
pub mod records;
pub mod report;
pub mod table;
pub mod xlsx;

use std::path::Path;

pub use error::{ReportError, SourceError};
pub use records::{parse_records, ParsedRecords, RecordSchema, RowDiagnostic, SkipReason};
pub use report::{write_report, ReportDocument, ReportStatus};
pub use table::{Cell, Table};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Read a tabular file, dispatching on extension. `sheet` only applies to
/// spreadsheet formats.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        self::xlsx::read_table(path, sheet)
    } else if ext == "csv" || ext == "tsv" {
        if let Some(sheet) = sheet {
            log::debug!("ignoring sheet '{}' for delimited file {}", sheet, path.display());
        }
        self::csv::read_table(path)
    } else {
        Err(SourceError::UnsupportedFormat(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension() {
        let err = read_table(Path::new("bills.pdf"), None).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFormat(_)));
    }
}
