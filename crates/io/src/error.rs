use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems with an input table. Row-level problems are diagnostics,
/// not errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("sheet '{sheet}' not found (available: {})", .available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("malformed CSV at line {line}: {message}")]
    Csv { line: u64, message: String },

    #[error("input has no header row")]
    Empty,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_all() {
        let err = SourceError::MissingColumns(vec!["Supplier".into(), "Bank Date".into()]);
        assert_eq!(err.to_string(), "missing required columns: Supplier, Bank Date");
    }
}
