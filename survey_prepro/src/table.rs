//! In-memory tabular data.
//!
//! A `Table` is an ordered list of uniquely named columns of equal length.
//! Transformations never mutate a table they borrow: they clone it and return
//! the new value, so a caller can keep any earlier snapshot around.

use std::collections::HashSet;
use std::fmt::Display;

use snafu::ensure;

use crate::config::*;

/// A single value of a survey table.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum Cell {
    #[default]
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

/// A hashable view of a cell, used for distinct counts and join keys.
///
/// Floats compare by bit pattern: no tolerance, no normalization.
#[derive(Eq, PartialEq, Debug, Clone, Hash, PartialOrd, Ord)]
pub enum CellKey {
    Missing,
    Int(i64),
    Float(u64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn is_present(&self) -> bool {
        !self.is_missing()
    }

    pub fn key(&self) -> CellKey {
        match self {
            Cell::Missing => CellKey::Missing,
            Cell::Int(i) => CellKey::Int(*i),
            Cell::Float(f) => CellKey::Float(f.to_bits()),
            Cell::Text(s) => CellKey::Text(s.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The textual form of a present cell.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            c => Some(c.to_string()),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Float(x)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(Cell::Missing)
    }
}

/// The value type of a column, inferred from its present cells.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ColumnKind {
    /// Every cell is missing.
    Empty,
    Integer,
    /// At least one float and no text.
    Float,
    Text,
    /// Text mixed with numbers.
    Mixed,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: &str, cells: Vec<Cell>) -> Column {
        Column {
            name: name.to_string(),
            cells,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        let (mut ints, mut floats, mut texts) = (false, false, false);
        for c in self.cells.iter() {
            match c {
                Cell::Missing => {}
                Cell::Int(_) => ints = true,
                Cell::Float(_) => floats = true,
                Cell::Text(_) => texts = true,
            }
        }
        match (ints, floats, texts) {
            (false, false, false) => ColumnKind::Empty,
            (_, _, true) if ints || floats => ColumnKind::Mixed,
            (_, _, true) => ColumnKind::Text,
            (_, true, false) => ColumnKind::Float,
            (true, false, false) => ColumnKind::Integer,
        }
    }

    /// Number of distinct non-missing values.
    pub fn distinct_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.is_present())
            .map(Cell::key)
            .collect::<HashSet<CellKey>>()
            .len()
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Assembles a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> PrepResult<Table> {
        let num_rows = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        let mut seen: HashSet<&str> = HashSet::new();
        for col in columns.iter() {
            ensure!(
                seen.insert(col.name.as_str()),
                DuplicateColumnSnafu {
                    name: col.name.clone()
                }
            );
            ensure!(
                col.cells.len() == num_rows,
                ColumnLengthSnafu {
                    name: col.name.clone(),
                    expected: num_rows,
                    found: col.cells.len(),
                }
            );
        }
        Ok(Table { columns, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Mutable access to the cells. The slice keeps the set of columns fixed.
    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        self.column(column).and_then(|c| c.cells.get(row))
    }

    /// Appends a column, or replaces the cells of an existing column with the same name.
    pub fn set_column(&mut self, column: Column) -> PrepResult<()> {
        ensure!(
            self.columns.is_empty() || column.cells.len() == self.num_rows,
            ColumnLengthSnafu {
                name: column.name.clone(),
                expected: self.num_rows,
                found: column.cells.len(),
            }
        );
        if self.columns.is_empty() {
            self.num_rows = column.cells.len();
        }
        match self.column_mut(&column.name) {
            Some(existing) => existing.cells = column.cells,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Renames a column in place, keeping its position. Returns false if `from` does not exist.
    /// The caller is responsible for `to` not being taken already.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_mut(from) {
            Some(col) => {
                col.name = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// The values of a row, in column order.
    pub fn row(&self, idx: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.cells[idx]).collect()
    }

    /// Stacks tables with identical column names on top of each other.
    /// Tables with a different set of columns are ignored.
    pub fn concat(tables: &[Table]) -> Table {
        let first = match tables.iter().find(|t| !t.is_empty()) {
            Some(t) => t,
            None => return Table::default(),
        };
        let names = first.column_names();
        let mut columns: Vec<Column> = names.iter().map(|n| Column::new(n, Vec::new())).collect();
        let mut num_rows = 0;
        for t in tables.iter().filter(|t| t.column_names() == names) {
            for (dst, src) in columns.iter_mut().zip(t.columns.iter()) {
                dst.cells.extend(src.cells.iter().cloned());
            }
            num_rows += t.num_rows;
        }
        Table { columns, num_rows }
    }
}

/// A table with the name it is exported under.
#[derive(PartialEq, Debug, Clone)]
pub struct NamedTable {
    pub name: String,
    pub table: Table,
}
