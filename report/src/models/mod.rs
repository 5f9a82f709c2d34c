//! Domain models for the sales report.
//!
//! - [`CellValue`] - One dynamically typed cell
//! - [`Column`] - A named column of cells
//! - [`RecordSet`] - Column-major table of transaction rows
//! - [`Schema`] - Names of the columns with a special role (outlet, quantity, ...)

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// Cell Value
// =============================================================================

/// A single cell of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Build a text cell, mapping empty strings to [`CellValue::Null`].
    pub fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// String form used for membership comparison.
    ///
    /// `None` for nulls: a null never equals a configured value.
    pub fn as_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(true) => Some("True".to_string()),
            CellValue::Bool(false) => Some("False".to_string()),
            CellValue::Int(i) => Some(i.to_string()),
            // Debug keeps the trailing ".0" on integral floats
            CellValue::Float(f) => Some(format!("{:?}", f)),
            CellValue::Text(s) => Some(s.clone()),
        }
    }

    /// Text content, if this is a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used for sums. Nulls, booleans and unparseable text count as zero.
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Int(i) => *i as f64,
            CellValue::Float(f) => *f,
            CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            CellValue::Null | CellValue::Bool(_) => 0.0,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Int(_) | CellValue::Float(_) => 2,
            CellValue::Text(_) => 3,
        }
    }

    /// Total order used to sort groups: nulls first, then booleans,
    /// numbers (numerically), and text (lexicographically).
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Int(a), CellValue::Int(b)) => a.cmp(b),
            (CellValue::Int(_) | CellValue::Float(_), CellValue::Int(_) | CellValue::Float(_)) => {
                self.as_f64().total_cmp(&other.as_f64())
            }
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_key() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// =============================================================================
// Record Set
// =============================================================================

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self { name: name.into(), values }
    }
}

/// In-memory table of transaction rows, stored column by column.
///
/// All columns have the same length. Filtering produces a new record set
/// through [`RecordSet::take`]; the loaded set itself is never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    columns: Vec<Column>,
    row_count: usize,
}

impl RecordSet {
    /// Build a record set from columns. Shorter columns are padded with nulls.
    pub fn new(columns: Vec<Column>) -> Self {
        let row_count = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let columns = columns
            .into_iter()
            .map(|mut c| {
                c.values.resize(row_count, CellValue::Null);
                c
            })
            .collect();
        Self { columns, row_count }
    }

    /// Build a record set from a header and row-major data.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let mut columns: Vec<Column> = headers.iter().map(|h| Column::new(*h, Vec::with_capacity(rows.len()))).collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(cells.next().unwrap_or(CellValue::Null));
            }
        }
        Self::new(columns)
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.values.as_slice())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Cell at `row` in column `name`.
    pub fn value(&self, name: &str, row: usize) -> Option<&CellValue> {
        self.column(name).and_then(|values| values.get(row))
    }

    /// New record set holding only the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> RecordSet {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: rows.iter().map(|&r| c.values[r].clone()).collect(),
            })
            .collect();
        RecordSet { columns, row_count: rows.len() }
    }

    /// Keep the rows for which `keep(row_index)` is true.
    pub fn retain_rows<F>(&self, mut keep: F) -> RecordSet
    where
        F: FnMut(usize) -> bool,
    {
        let rows: Vec<usize> = (0..self.row_count).filter(|&r| keep(r)).collect();
        self.take(&rows)
    }

    /// Sum of a column's numeric view; zero when the column is absent.
    pub fn sum(&self, name: &str) -> f64 {
        self.column(name).map(|values| values.iter().map(CellValue::as_f64).sum::<f64>()).unwrap_or(0.0)
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Column names with a special meaning to the engine.
///
/// Defaults match the regional sales database layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Outlet identifier, the unit of the quantity threshold.
    pub outlet: String,
    /// Quantity measure.
    pub quantity: String,
    /// Value measure.
    pub value: String,
    /// Salesperson name, target of the prefix filter.
    pub salesperson: String,
    /// Filter key holding the salesperson name prefix.
    pub salesperson_prefix_key: String,
    /// Numeric columns that never take part in grouping.
    pub measures: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            outlet: "KODE OUTLET".to_string(),
            quantity: "QTY".to_string(),
            value: "VALUE".to_string(),
            salesperson: "NAMA SLS2".to_string(),
            salesperson_prefix_key: "NAMA_SLS2_AWAL".to_string(),
            measures: vec!["QTY".to_string(), "VALUE".to_string(), "VALUE NETT".to_string()],
        }
    }
}

impl Schema {
    pub fn is_measure(&self, column: &str) -> bool {
        self.measures.iter().any(|m| m == column)
    }
}
