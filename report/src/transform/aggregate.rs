//! Aggregator / formatter.
//!
//! Groups filtered rows by the requested columns, sums quantity and value per
//! group and builds the display table.
//!
//! ```text
//! Filtered rows                       →  Result table
//! ┌──────────────────────────────┐      ┌───────────────────────────────┐
//! │ PMA: P1, SLS: A, QTY 1, V 10 │      │ PMA  SLS  QTY_fmt  VALUE_fmt  │
//! │ PMA: P1, SLS: A, QTY 2, V 20 │  →   │ P1   A    3.0      30         │
//! │ PMA: P2, SLS: B, QTY 5, V 50 │      │ P2   B    5.0      50         │
//! └──────────────────────────────┘      └───────────────────────────────┘
//! ```

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::constraint::Threshold;
use super::filter::SchemaWarning;
use super::format::FormatPolicy;
use crate::error::{ConfigError, ConfigResult};
use crate::logs::{log_info_indent, log_warning};
use crate::models::{CellValue, RecordSet, Schema};

/// Header of the formatted quantity column.
pub const QUANTITY_FMT_COLUMN: &str = "QTY_fmt";

/// Header of the formatted value column.
pub const VALUE_FMT_COLUMN: &str = "VALUE_fmt";

/// What to group by and what to show.
#[derive(Debug, Clone, Default)]
pub struct AggregateSpec {
    /// Grouping key columns, in order.
    pub group_by: Vec<String>,
    /// Display order of the key columns. Empty means `group_by` order.
    pub display: Vec<String>,
    /// Re-apply this threshold to each group's summed quantity after grouping.
    pub recheck: Option<Threshold>,
    pub format: FormatPolicy,
}

impl AggregateSpec {
    pub fn new(group_by: Vec<String>) -> Self {
        Self { group_by, ..Self::default() }
    }

    pub fn with_display(mut self, display: Vec<String>) -> Self {
        self.display = display;
        self
    }

    pub fn with_recheck(mut self, threshold: Option<Threshold>) -> Self {
        self.recheck = threshold;
        self
    }
}

/// One grouped row of the display table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    /// Values of the display key columns.
    pub cells: Vec<CellValue>,
    /// Unrounded quantity sum.
    pub quantity: f64,
    /// Unrounded value sum.
    pub value: f64,
    pub quantity_fmt: String,
    pub value_fmt: String,
}

/// Grouped, formatted result with its totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    /// Display key columns (without the formatted measure columns).
    pub columns: Vec<String>,
    pub rows: Vec<DisplayRow>,
    pub total_quantity: f64,
    pub total_value: f64,
}

impl ResultTable {
    /// Full header: key columns followed by the two formatted measures.
    pub fn header(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .chain([QUANTITY_FMT_COLUMN, VALUE_FMT_COLUMN])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Aggregation result plus dropped-column diagnostics.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub table: ResultTable,
    pub group_columns: Vec<String>,
    pub warnings: Vec<SchemaWarning>,
}

/// Grouping key ordered with [`CellValue::total_cmp`].
#[derive(Debug, Clone)]
struct GroupKey(Vec<CellValue>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| self.0.len().cmp(&other.0.len()))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Sums {
    quantity: f64,
    value: f64,
}

/// Group `records` and build the display table.
///
/// Fails with [`ConfigError::NoValidGroupingColumns`] when none of the
/// requested grouping columns can be used.
pub fn aggregate(records: &RecordSet, spec: &AggregateSpec, schema: &Schema) -> ConfigResult<Aggregation> {
    let mut warnings = Vec::new();

    let group_columns = valid_group_columns(records, &spec.group_by, schema, &mut warnings);
    if group_columns.is_empty() {
        return Err(ConfigError::NoValidGroupingColumns {
            requested: spec.group_by.clone(),
        });
    }

    for measure in [&schema.quantity, &schema.value] {
        if !records.has_column(measure) {
            let warning = SchemaWarning::MissingMeasureColumn { column: measure.clone() };
            log_warning(warning.to_string());
            warnings.push(warning);
        }
    }

    let key_columns: Vec<&[CellValue]> = group_columns
        .iter()
        .filter_map(|c| records.column(c))
        .collect();
    let quantities = records.column(&schema.quantity);
    let values = records.column(&schema.value);

    let mut groups: BTreeMap<GroupKey, Sums> = BTreeMap::new();
    for row in 0..records.len() {
        let key = GroupKey(key_columns.iter().map(|column| column[row].clone()).collect());
        let sums = groups.entry(key).or_default();
        sums.quantity += quantities.map(|q| q[row].as_f64()).unwrap_or(0.0);
        sums.value += values.map(|v| v[row].as_f64()).unwrap_or(0.0);
    }

    if let Some(threshold) = &spec.recheck {
        let before = groups.len();
        groups.retain(|_, sums| threshold.accepts(sums.quantity));
        log_info_indent(
            format!("Threshold recheck on groups ({}): {} → {} groups", threshold, before, groups.len()),
            1,
        );
    }

    // Display columns: caller order, restricted to the grouping columns in use
    let requested_display = if spec.display.is_empty() { &spec.group_by } else { &spec.display };
    let display: Vec<(String, usize)> = requested_display
        .iter()
        .filter_map(|name| group_columns.iter().position(|g| g == name).map(|idx| (name.clone(), idx)))
        .collect();

    let rows: Vec<DisplayRow> = groups
        .into_iter()
        .map(|(key, sums)| DisplayRow {
            cells: display.iter().map(|(_, idx)| key.0[*idx].clone()).collect(),
            quantity: sums.quantity,
            value: sums.value,
            quantity_fmt: spec.format.quantity(sums.quantity),
            value_fmt: spec.format.value(sums.value),
        })
        .collect();

    let total_quantity: f64 = rows.iter().map(|r| r.quantity).sum();
    let total_value: f64 = rows.iter().map(|r| r.value).sum();

    Ok(Aggregation {
        table: ResultTable {
            columns: display.into_iter().map(|(name, _)| name).collect(),
            rows,
            total_quantity,
            total_value,
        },
        group_columns,
        warnings,
    })
}

/// Requested grouping columns that exist and are not measures, in caller order.
fn valid_group_columns(
    records: &RecordSet,
    requested: &[String],
    schema: &Schema,
    warnings: &mut Vec<SchemaWarning>,
) -> Vec<String> {
    let mut valid: Vec<String> = Vec::new();

    for column in requested {
        let warning = if schema.is_measure(column) {
            Some(SchemaWarning::MeasureGroupColumn { column: column.clone() })
        } else if !records.has_column(column) {
            Some(SchemaWarning::MissingGroupColumn { column: column.clone() })
        } else {
            None
        };

        match warning {
            Some(warning) => {
                log_warning(warning.to_string());
                warnings.push(warning);
            }
            None if !valid.contains(column) => valid.push(column.clone()),
            None => {}
        }
    }

    valid
}
