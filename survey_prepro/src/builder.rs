pub use crate::config::*;
use crate::table::*;

use std::collections::HashSet;

use snafu::ensure;

/// A builder for assembling a table row by row.
///
/// Readers use it to turn spreadsheet or CSV records into a `Table`.
///
/// ```
/// use survey_prepro::builder::TableBuilder;
/// use survey_prepro::{Cell, PrepError};
///
/// let mut builder = TableBuilder::new(&["id", "Q1", "Q1(TEXT)"])?;
///
/// builder.add_row_simple(&["1001", "3", "Agree"])?;
/// builder.add_row(&[Cell::from("1002"), Cell::Missing, Cell::Missing])?;
///
/// let table = builder.build();
/// assert_eq!(table.num_rows(), 2);
/// assert_eq!(table.cell(0, "Q1"), Some(&Cell::Int(3)));
///
/// # Ok::<(), PrepError>(())
/// ```
pub struct Builder {
    pub(crate) _names: Vec<String>,
    pub(crate) _columns: Vec<Vec<Cell>>,
}

pub type TableBuilder = Builder;

impl Builder {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Builder, PrepError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for n in names {
            ensure!(
                seen.insert(n.as_ref()),
                DuplicateColumnSnafu {
                    name: n.as_ref().to_string()
                }
            );
        }
        Ok(Builder {
            _names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            _columns: vec![Vec::new(); names.len()],
        })
    }

    pub fn num_rows(&self) -> usize {
        self._columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Adds a row of already typed cells.
    pub fn add_row(&mut self, cells: &[Cell]) -> Result<(), PrepError> {
        self.add_row_2(cells.to_vec())
    }

    /// Adds a row of raw strings. Each value is typed with `parse_cell`.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_row_simple<S: AsRef<str>>(&mut self, values: &[S]) -> Result<(), PrepError> {
        self.add_row_2(values.iter().map(|v| parse_cell(v.as_ref())).collect())
    }

    pub fn add_row_2(&mut self, cells: Vec<Cell>) -> Result<(), PrepError> {
        ensure!(
            cells.len() == self._names.len(),
            RowLengthSnafu {
                row: self.num_rows(),
                expected: self._names.len(),
                found: cells.len(),
            }
        );
        for (col, cell) in self._columns.iter_mut().zip(cells) {
            col.push(cell);
        }
        Ok(())
    }

    pub fn build(self) -> Table {
        let columns: Vec<Column> = self
            ._names
            .into_iter()
            .zip(self._columns)
            .map(|(name, cells)| Column { name, cells })
            .collect();
        // Names were checked at construction and every row has the full width.
        Table::new(columns).unwrap_or_default()
    }
}

/// Types a raw string value: empty is missing, then integer, then float, then text.
///
/// Surrounding whitespace is kept for text values: strata keys compare exactly.
pub fn parse_cell(s: &str) -> Cell {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Cell::Missing;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Cell::Int(i);
    }
    match trimmed.parse::<f64>() {
        Ok(x) if x.is_finite() => Cell::Float(x),
        _ => Cell::Text(s.to_string()),
    }
}
