// Excel/ODS table reading via calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::error::SourceError;
use crate::table::{Cell, Table};

/// Read one worksheet (the named one, or the first) of an xlsx/xlsm/xls/xlsb/ods file.
///
/// The first non-empty row of the used range is the header.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, SourceError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| SourceError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| SourceError::SheetNotFound {
                sheet: wanted.to_string(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names.first().cloned().ok_or_else(|| SourceError::Workbook {
            path: path.to_path_buf(),
            message: "workbook contains no sheets".to_string(),
        })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SourceError::Workbook {
            path: path.to_path_buf(),
            message: format!("failed to read sheet '{}': {}", sheet_name, e),
        })?;

    let mut rows = range.rows().map(|row| row.iter().map(convert).collect::<Vec<Cell>>());
    let headers = match rows.next() {
        Some(header) => header.iter().map(|c| c.as_text().unwrap_or_default()).collect(),
        None => Vec::new(),
    };
    let data: Vec<Vec<Cell>> = rows.collect();

    log::debug!(
        "read sheet '{}' from {}: {} columns, {} data rows",
        sheet_name,
        path.display(),
        headers.len(),
        data.len()
    );
    Ok(Table::new(headers, data))
}

fn convert(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Int(*n),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        // 1900 date system assumed; calamine keeps the 1904 flag private.
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
