//! Rectangular, text-only data model shared by the text and spreadsheet readers.
//!
//! A [`Table`] holds an ordered list of column names and rows of nullable text
//! values. Readers guarantee every row has exactly one slot per column; short
//! source records are right-padded with `None`. Values are never coerced to
//! numbers or dates, so scoring and escaping see exactly what the source held.

use serde::{Deserialize, Serialize};

/// One record: a nullable text value per column.
pub type Row = Vec<Option<String>>;

/// Tokens read as null by default, matching the usual spreadsheet/pandas NA set.
pub const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#NA", "N/A", "n/a", "NA", "<NA>", "NULL", "null", "NaN", "nan", "-NaN", "-nan",
    "None",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows.into_iter().map(|row| pad_row(row, width)).collect();
        Self { columns, rows }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, right-padding it with nulls up to the column count.
    pub fn push_row(&mut self, row: Row) {
        let width = self.columns.len();
        self.rows.push(pad_row(row, width));
    }

    /// Rows holding at least one non-null value.
    pub fn non_empty_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.iter().any(Option::is_some))
            .count()
    }
}

/// Maps raw field text to a nullable value using a configurable marker list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullMarkers {
    markers: Vec<String>,
}

impl NullMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(&self, value: &str) -> bool {
        self.markers.iter().any(|marker| marker == value)
    }

    pub fn cell(&self, value: &str) -> Option<String> {
        if self.is_null(value) {
            None
        } else {
            Some(value.to_string())
        }
    }
}

impl Default for NullMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_NULL_MARKERS.iter().copied())
    }
}

fn pad_row(mut row: Row, width: usize) -> Row {
    if row.len() < width {
        row.resize(width, None);
    }
    row
}
