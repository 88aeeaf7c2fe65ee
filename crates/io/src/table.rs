// In-memory table: one header row plus typed data rows

/// A single cell value as read from a workbook or CSV file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
    /// Native date/time cell, as an Excel serial (1900 system).
    DateTime(f64),
}

impl Cell {
    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed display text, or `None` when blank.
    ///
    /// Whole floats render without a decimal point, so a numeric ID typed
    /// into Excel as 1001 reads back as "1001".
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            Cell::Empty => return None,
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Int(n) => n.to_string(),
            Cell::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Cell::DateTime(serial) => format!("{}", serial),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Header lookup, exact match after trimming.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Data row count (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (data row, column). Short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(EMPTY)
    }

    /// 1-based spreadsheet row number for a data row index.
    pub fn sheet_row(data_row: usize) -> usize {
        data_row + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_render_without_decimals() {
        assert_eq!(Cell::Number(1001.0).as_text().as_deref(), Some("1001"));
        assert_eq!(Cell::Number(10.5).as_text().as_deref(), Some("10.5"));
        assert_eq!(Cell::Int(-4).as_text().as_deref(), Some("-4"));
        assert_eq!(Cell::Text("  P1 ".into()).as_text().as_deref(), Some("P1"));
        assert_eq!(Cell::Text("   ".into()).as_text(), None);
    }

    #[test]
    fn short_rows_read_as_empty() {
        let table = Table::new(
            vec!["A".into(), " B ".into()],
            vec![vec![Cell::from("x")]],
        );
        assert_eq!(table.column_index("B"), Some(1));
        assert_eq!(table.cell(0, 1), &Cell::Empty);
        assert_eq!(table.cell(5, 0), &Cell::Empty);
        assert_eq!(Table::sheet_row(0), 2);
    }
}
