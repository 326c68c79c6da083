//! Label-indexed rectangular tables with an explicit missing marker.

use serde::Serialize;
use std::fmt;

/// One table cell. `Empty` is the explicit "no value" marker — missing
/// source data is never rendered as zero. `Text` exists for the formatted
/// load-factor percentage, which the upstream convention renders as a
/// string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn from_option(v: Option<f64>) -> Self {
        match v {
            Some(x) => Cell::Number(x),
            None => Cell::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(x) => write!(f, "{x}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// A rectangular table: an ordered row index (time or region labels), a
/// fixed column order, and one `Cell` per (row, column).
///
/// Invariant: every row has exactly one cell per declared column. Days are
/// stacked with [`Table::append`] to form a continuous datetime-indexed
/// dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    index_name: String,
    columns: Vec<String>,
    index: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(index_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            columns,
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build a table from an index and ordered named columns.
    ///
    /// Panics if any column length differs from the index length — that is
    /// a programming error, not a data condition.
    pub fn from_columns(
        index_name: impl Into<String>,
        index: Vec<String>,
        columns: Vec<(String, Vec<Cell>)>,
    ) -> Self {
        for (name, cells) in &columns {
            assert_eq!(
                cells.len(),
                index.len(),
                "column '{name}' length does not match index length"
            );
        }
        let names = columns.iter().map(|(n, _)| n.clone()).collect();
        let rows = (0..index.len())
            .map(|i| columns.iter().map(|(_, cells)| cells[i].clone()).collect())
            .collect();
        Self {
            index_name: index_name.into(),
            columns: names,
            index,
            rows,
        }
    }

    pub fn push_row(&mut self, label: impl Into<String>, cells: Vec<Cell>) {
        assert_eq!(
            cells.len(),
            self.columns.len(),
            "row arity does not match declared columns"
        );
        self.index.push(label.into());
        self.rows.push(cells);
    }

    /// Stack another table's rows below this one. Column sets must match.
    pub fn append(&mut self, other: Table) {
        assert_eq!(
            self.columns, other.columns,
            "cannot append tables with different columns"
        );
        self.index.extend(other.index);
        self.rows.extend(other.rows);
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, i: usize) -> &[Cell] {
        &self.rows[i]
    }

    /// Cell at (row label, column name), if both exist.
    pub fn cell(&self, label: &str, column: &str) -> Option<&Cell> {
        let r = self.index.iter().position(|l| l == label)?;
        let c = self.columns.iter().position(|n| n == column)?;
        Some(&self.rows[r][c])
    }

    /// Content hash over index, columns, and cells. Two runs that produce
    /// the same data produce the same fingerprint, which is how the
    /// idempotence tests and the export manifest identify a table.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("Table serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
