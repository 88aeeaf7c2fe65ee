//! Schema-checked conversion from a [`Table`] to reconciliation records.
//!
//! The header row is validated once against a [`RecordSchema`]; every
//! required column must be present before any row is looked at. Row-level
//! problems never abort the parse: the row (or just the field) is dropped
//! and a [`RowDiagnostic`] explains why.

use std::fmt;

use billsync_recon::{Origin, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{excel_serial_to_date, parse_date_text};
use crate::error::SourceError;
use crate::money::{minor_from_float, parse_money_minor};
use crate::table::{Cell, Table};

/// Column names for each record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSchema {
    pub key: String,
    pub line_id: String,
    pub counterparty: String,
    pub amount: String,
    pub date: String,
    pub category: String,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            key: "Parent ID".to_string(),
            line_id: "Child ID".to_string(),
            counterparty: "Supplier".to_string(),
            amount: "Check Amount".to_string(),
            date: "Bank Date".to_string(),
            category: "Tier 2 - Chart of Account".to_string(),
        }
    }
}

impl RecordSchema {
    /// Required column names, in declaration order.
    pub fn required(&self) -> [&str; 6] {
        [
            self.key.as_str(),
            self.line_id.as_str(),
            self.counterparty.as_str(),
            self.amount.as_str(),
            self.date.as_str(),
            self.category.as_str(),
        ]
    }

    /// Resolve every column against the header row, reporting all missing
    /// columns at once.
    pub fn resolve(&self, table: &Table) -> Result<ResolvedColumns, SourceError> {
        let missing: Vec<String> = self
            .required()
            .iter()
            .filter(|name| table.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SourceError::MissingColumns(missing));
        }

        let idx = |name: &str| table.column_index(name).unwrap_or_default();
        Ok(ResolvedColumns {
            key: idx(&self.key),
            line_id: idx(&self.line_id),
            counterparty: idx(&self.counterparty),
            amount: idx(&self.amount),
            date: idx(&self.date),
            category: idx(&self.category),
        })
    }
}

/// Column indices after header validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub key: usize,
    pub line_id: usize,
    pub counterparty: usize,
    pub amount: usize,
    pub date: usize,
    pub category: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingKey,
    BadAmount,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingKey => write!(f, "missing key"),
            SkipReason::BadAmount => write!(f, "bad amount"),
        }
    }
}

/// A row-level problem. `row` is the 1-based sheet row (header is row 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowDiagnostic {
    /// The whole row was dropped.
    SkippedRow {
        row: usize,
        reason: SkipReason,
        detail: String,
    },
    /// The row was kept but one field was cleared.
    SkippedField {
        row: usize,
        column: String,
        detail: String,
    },
}

impl RowDiagnostic {
    pub fn is_row_skip(&self) -> bool {
        matches!(self, RowDiagnostic::SkippedRow { .. })
    }
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowDiagnostic::SkippedRow {
                row,
                reason,
                detail,
            } => {
                write!(f, "row {}: skipped ({}): {}", row, reason, detail)
            }
            RowDiagnostic::SkippedField {
                row,
                column,
                detail,
            } => {
                write!(f, "row {}: ignored '{}': {}", row, column, detail)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecords {
    pub records: Vec<Record>,
    pub skipped: Vec<RowDiagnostic>,
}

impl ParsedRecords {
    /// Rows dropped entirely.
    pub fn skipped_rows(&self) -> usize {
        self.skipped.iter().filter(|d| d.is_row_skip()).count()
    }
}

/// Convert a table into records tagged with `origin`.
///
/// Only a table with no header row at all is `Empty`. A header with no data
/// rows is valid input and yields zero records.
pub fn parse_records(
    table: &Table,
    schema: &RecordSchema,
    origin: Origin,
) -> Result<ParsedRecords, SourceError> {
    if table.headers.is_empty() && table.is_empty() {
        return Err(SourceError::Empty);
    }
    let cols = schema.resolve(table)?;

    let mut parsed = ParsedRecords::default();
    for (idx, row) in table.rows.iter().enumerate() {
        if row.iter().all(Cell::is_blank) {
            continue;
        }
        let sheet_row = Table::sheet_row(idx);
        let cell = |col: usize| table.cell(idx, col);

        let Some(key) = cell(cols.key).as_text() else {
            let diag = RowDiagnostic::SkippedRow {
                row: sheet_row,
                reason: SkipReason::MissingKey,
                detail: format!("'{}' is empty", schema.key),
            };
            log::warn!("{}", diag);
            parsed.skipped.push(diag);
            continue;
        };

        let amount_cents = match parse_amount(cell(cols.amount)) {
            Ok(amount) => amount,
            Err(detail) => {
                let diag = RowDiagnostic::SkippedRow {
                    row: sheet_row,
                    reason: SkipReason::BadAmount,
                    detail,
                };
                log::warn!("{}", diag);
                parsed.skipped.push(diag);
                continue;
            }
        };

        let occurred_on = match parse_date(cell(cols.date)) {
            Ok(date) => date,
            Err(detail) => {
                let diag = RowDiagnostic::SkippedField {
                    row: sheet_row,
                    column: schema.date.clone(),
                    detail,
                };
                log::warn!("{}", diag);
                parsed.skipped.push(diag);
                None
            }
        };

        parsed.records.push(Record {
            memo: Some(key.clone()),
            key,
            counterparty: cell(cols.counterparty).as_text(),
            occurred_on,
            category: cell(cols.category).as_text(),
            amount_cents,
            line_memo: cell(cols.line_id).as_text(),
            origin,
        });
    }

    log::info!(
        "parsed {} records from {} rows ({} skipped)",
        parsed.records.len(),
        table.len(),
        parsed.skipped_rows()
    );
    Ok(parsed)
}

fn parse_amount(cell: &Cell) -> Result<Option<i64>, String> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Text(s) if s.trim().is_empty() => Ok(None),
        Cell::Text(s) => parse_money_minor(s).map(Some),
        Cell::Number(n) => minor_from_float(*n).map(Some),
        Cell::Int(n) => n
            .checked_mul(100)
            .map(Some)
            .ok_or_else(|| format!("amount out of range: {}", n)),
        Cell::Bool(_) | Cell::DateTime(_) => {
            Err(format!("not an amount: {}", cell.as_text().unwrap_or_default()))
        }
    }
}

fn parse_date(cell: &Cell) -> Result<Option<NaiveDate>, String> {
    let parsed = match cell {
        Cell::Empty => return Ok(None),
        Cell::Text(s) if s.trim().is_empty() => return Ok(None),
        Cell::Text(s) => parse_date_text(s),
        Cell::DateTime(serial) | Cell::Number(serial) => excel_serial_to_date(*serial),
        Cell::Int(n) => excel_serial_to_date(*n as f64),
        Cell::Bool(_) => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| format!("unrecognized date: {}", cell.as_text().unwrap_or_default()))
}
