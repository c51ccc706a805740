//! Uniform cell matrix produced by the tabular readers.

use serde::{Deserialize, Serialize};

/// One cell of a tabular source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// The cell as text, trimmed. Numbers are not stringified.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.trim()),
            _ => None,
        }
    }

    /// The cell as a number, parsing numeric-looking text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Display form used for labels and headers.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => {
                // Integral floats read back from spreadsheets print without ".0".
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Empty => String::new(),
        }
    }

    /// True when the cell text (or integral number) matches `keyword`.
    pub fn matches(&self, keyword: &str, exact: bool) -> bool {
        let text = self.display();
        if text.is_empty() {
            return false;
        }
        if exact {
            text == keyword
        } else {
            text.contains(keyword)
        }
    }
}

/// Dense 2-D matrix of cells; rows may be ragged at the source, access is
/// bounds-checked and missing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMatrix {
    rows: Vec<Vec<Cell>>,
}

impl CellMatrix {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn n_columns(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn get(&self, row: usize, column: usize) -> &Cell {
        const EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }

    pub fn in_bounds(&self, row: usize, column: usize) -> bool {
        row < self.n_rows() && column < self.n_columns()
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_is_empty(&self, row: usize) -> bool {
        self.row(row).iter().all(Cell::is_empty)
    }

    pub fn column_is_empty(&self, column: usize) -> bool {
        (0..self.n_rows()).all(|r| self.get(r, column).is_empty())
    }
}
