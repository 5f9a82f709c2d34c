//! Filter engine.
//!
//! Narrows a [`RecordSet`] with a [`FilterSpec`]. Constraints run in a fixed
//! order, each on the output of the previous one:
//!
//! 1. quantity threshold per outlet (on the widest base)
//! 2. salesperson name prefix
//! 3. generic column memberships
//!
//! Constraints on columns missing from the dataset are skipped and reported
//! as [`SchemaWarning`]s; they never fail the run.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::constraint::{Constraint, FilterSpec, Threshold};
use crate::logs::{log_info_indent, log_warning};
use crate::models::RecordSet;

/// A configured column that does not exist in the loaded data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaWarning {
    /// A filter referenced a missing column and was skipped.
    MissingFilterColumn { column: String, constraint: String },
    /// A grouping column is missing and was dropped from the key.
    MissingGroupColumn { column: String },
    /// A measure column was requested as a grouping column and was dropped.
    MeasureGroupColumn { column: String },
    /// A measure column is missing; its sums are zero.
    MissingMeasureColumn { column: String },
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaWarning::MissingFilterColumn { column, constraint } => {
                write!(f, "Column '{}' not found, {} filter skipped", column, constraint)
            }
            SchemaWarning::MissingGroupColumn { column } => {
                write!(f, "Column '{}' not found, dropped from grouping", column)
            }
            SchemaWarning::MeasureGroupColumn { column } => {
                write!(f, "Column '{}' is numeric, dropped from grouping", column)
            }
            SchemaWarning::MissingMeasureColumn { column } => {
                write!(f, "Column '{}' not found, its totals count as zero", column)
            }
        }
    }
}

/// Filtered rows plus the diagnostics collected on the way.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub records: RecordSet,
    pub warnings: Vec<SchemaWarning>,
}

/// Apply every constraint of `spec`, in evaluation order.
///
/// The result keeps the input's row order and all of its columns.
pub fn apply_filters(records: &RecordSet, spec: &FilterSpec) -> FilterOutcome {
    let mut current = records.clone();
    let mut warnings = Vec::new();

    for constraint in spec.ordered() {
        let before = current.len();
        match apply_constraint(&current, constraint) {
            Ok(narrowed) => {
                log_filter_step(constraint, before, narrowed.len());
                current = narrowed;
            }
            Err(warning) => {
                log_warning(warning.to_string());
                warnings.push(warning);
            }
        }
    }

    FilterOutcome { records: current, warnings }
}

/// Apply a single constraint. `Err` means the constraint was skipped because
/// a column it needs is missing.
pub fn apply_constraint(records: &RecordSet, constraint: &Constraint) -> Result<RecordSet, SchemaWarning> {
    match constraint {
        Constraint::Threshold(threshold) => apply_threshold(records, threshold),
        Constraint::Prefix { column, prefix } => {
            let values = records.column(column).ok_or_else(|| missing(column, constraint))?;
            Ok(records.retain_rows(|row| values[row].as_str().is_some_and(|name| name.starts_with(prefix.as_str()))))
        }
        Constraint::Membership { column, values: accepted } => {
            let values = records.column(column).ok_or_else(|| missing(column, constraint))?;
            let accepted: HashSet<&str> = accepted.iter().map(String::as_str).collect();
            Ok(records.retain_rows(|row| {
                values[row].as_key().is_some_and(|key| accepted.contains(key.as_str()))
            }))
        }
    }
}

/// Keep the rows of every group (outlet) whose summed quantity passes the threshold.
fn apply_threshold(records: &RecordSet, threshold: &Threshold) -> Result<RecordSet, SchemaWarning> {
    let constraint_name = "threshold";
    let groups = records.column(&threshold.group_by).ok_or_else(|| SchemaWarning::MissingFilterColumn {
        column: threshold.group_by.clone(),
        constraint: constraint_name.to_string(),
    })?;
    let quantities = records.column(&threshold.column).ok_or_else(|| SchemaWarning::MissingFilterColumn {
        column: threshold.column.clone(),
        constraint: constraint_name.to_string(),
    })?;

    let qualifying = qualifying_groups(groups.iter().map(|g| g.as_key()), quantities.iter().map(|q| q.as_f64()), threshold);

    // Rows without a group key belong to no outlet and never qualify
    Ok(records.retain_rows(|row| groups[row].as_key().is_some_and(|key| qualifying.contains(&key))))
}

/// Group keys whose summed quantity passes the threshold.
fn qualifying_groups<K, Q>(keys: K, quantities: Q, threshold: &Threshold) -> HashSet<String>
where
    K: Iterator<Item = Option<String>>,
    Q: Iterator<Item = f64>,
{
    let mut sums: HashMap<String, f64> = HashMap::new();
    for (key, quantity) in keys.zip(quantities) {
        if let Some(key) = key {
            *sums.entry(key).or_insert(0.0) += quantity;
        }
    }

    sums.into_iter()
        .filter(|(_, sum)| threshold.accepts(*sum))
        .map(|(key, _)| key)
        .collect()
}

fn missing(column: &str, constraint: &Constraint) -> SchemaWarning {
    SchemaWarning::MissingFilterColumn {
        column: column.to_string(),
        constraint: constraint.kind().to_string(),
    }
}

fn log_filter_step(constraint: &Constraint, before: usize, after: usize) {
    let description = match constraint {
        Constraint::Threshold(t) => t.to_string(),
        Constraint::Prefix { column, prefix } => format!("{} starts with '{}'", column, prefix),
        Constraint::Membership { column, values } => format!("{} in [{}]", column, values.join(", ")),
    };
    log_info_indent(format!("{}: {} → {} rows", description, before, after), 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, Schema};
    use crate::transform::constraint::Comparison;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    /// O1: 1 + 1 = 2, O2: 3, O3: 0.5 + 4 = 4.5, plus one row without outlet.
    fn sales() -> RecordSet {
        RecordSet::from_rows(
            &["KODE OUTLET", "NAMA SLS2", "CHANNEL", "KD_BRG", "QTY", "VALUE"],
            vec![
                vec![text("O1"), text("AE Budi"), text("GT"), CellValue::Int(303174), CellValue::Int(1), CellValue::Int(1000)],
                vec![text("O1"), text("AE Budi"), text("MT"), CellValue::Int(100200), CellValue::Int(1), CellValue::Int(1500)],
                vec![text("O2"), text("BX Sari"), text("GT"), CellValue::Int(303174), CellValue::Int(3), CellValue::Int(4500)],
                vec![text("O3"), CellValue::Null, text("GT"), CellValue::Int(303174), CellValue::Float(0.5), CellValue::Int(700)],
                vec![text("O3"), text("AEX Dewi"), text("MT"), CellValue::Int(100200), CellValue::Float(4.0), CellValue::Int(6000)],
                vec![CellValue::Null, text("AE Budi"), text("GT"), CellValue::Int(303174), CellValue::Int(9), CellValue::Int(9000)],
            ],
        )
    }

    fn threshold(op: Comparison, magnitude: f64) -> Constraint {
        Constraint::Threshold(Threshold {
            column: "QTY".into(),
            group_by: "KODE OUTLET".into(),
            comparison: op,
            magnitude,
        })
    }

    fn membership(column: &str, values: &[&str]) -> Constraint {
        Constraint::Membership {
            column: column.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn outlets(records: &RecordSet) -> Vec<String> {
        records.column("KODE OUTLET").unwrap().iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_spec_is_identity() {
        let records = sales();
        let spec = FilterSpec::from_entries(
            &[("CHANNEL".to_string(), vec![]), ("QTY".to_string(), vec![])],
            &Schema::default(),
        )
        .unwrap();

        let outcome = apply_filters(&records, &spec);
        assert_eq!(outcome.records, records);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_threshold_greater_than_is_strict() {
        let records = sales();
        let kept = apply_constraint(&records, &threshold(Comparison::GreaterThan, 2.0)).unwrap();
        assert_eq!(outlets(&kept), vec!["O2", "O3", "O3"]);
    }

    #[test]
    fn test_threshold_less_than_is_strict() {
        let records = sales();
        let kept = apply_constraint(&records, &threshold(Comparison::LessThan, 3.0)).unwrap();
        assert_eq!(outlets(&kept), vec!["O1", "O1"]);
    }

    #[test]
    fn test_threshold_partitions_outlets() {
        let records = sales();
        for magnitude in [0.0, 2.0, 2.5, 3.0, 4.5, 10.0] {
            for op in [Comparison::GreaterThan, Comparison::LessThan] {
                let kept = apply_constraint(&records, &threshold(op, magnitude)).unwrap();
                let kept_outlets: HashSet<String> = outlets(&kept).into_iter().collect();
                for (outlet, sum) in [("O1", 2.0), ("O2", 3.0), ("O3", 4.5)] {
                    assert_eq!(kept_outlets.contains(outlet), op.holds(sum, magnitude), "{outlet} {op:?} {magnitude}");
                }
            }
        }
    }

    #[test]
    fn test_threshold_drops_rows_without_outlet() {
        let records = sales();
        let kept = apply_constraint(&records, &threshold(Comparison::GreaterThan, -1.0)).unwrap();
        assert_eq!(kept.len(), 5);
        assert!(kept.column("KODE OUTLET").unwrap().iter().all(|c| !c.is_null()));
    }

    #[test]
    fn test_threshold_without_outlet_column_is_skipped() {
        let records = RecordSet::from_rows(&["QTY"], vec![vec![CellValue::Int(5)]]);
        let spec = FilterSpec::new().with(threshold(Comparison::GreaterThan, 2.0));

        let outcome = apply_filters(&records, &spec);
        assert_eq!(outcome.records, records);
        assert_eq!(
            outcome.warnings,
            vec![SchemaWarning::MissingFilterColumn {
                column: "KODE OUTLET".into(),
                constraint: "threshold".into(),
            }]
        );
    }

    #[test]
    fn test_threshold_without_quantity_column_is_skipped() {
        let records = RecordSet::from_rows(&["KODE OUTLET", "PMA"], vec![vec![text("O1"), text("P1")]]);
        let spec = FilterSpec::new().with(threshold(Comparison::GreaterThan, 2.0));

        let outcome = apply_filters(&records, &spec);
        assert_eq!(outcome.records, records);
        assert_eq!(
            outcome.warnings,
            vec![SchemaWarning::MissingFilterColumn {
                column: "QTY".into(),
                constraint: "threshold".into(),
            }]
        );
    }

    #[test]
    fn test_prefix_without_name_column_is_skipped() {
        let records = RecordSet::from_rows(&["KODE OUTLET", "PMA"], vec![vec![text("O1"), text("P1")]]);
        let spec = FilterSpec::new().with(Constraint::Prefix { column: "NAMA SLS2".into(), prefix: "AE".into() });

        let outcome = apply_filters(&records, &spec);
        assert_eq!(outcome.records, records);
        assert_eq!(
            outcome.warnings,
            vec![SchemaWarning::MissingFilterColumn {
                column: "NAMA SLS2".into(),
                constraint: "prefix".into(),
            }]
        );
    }

    #[test]
    fn test_prefix_filter() {
        let records = sales();
        let prefix = Constraint::Prefix { column: "NAMA SLS2".into(), prefix: "AE".into() };
        let kept = apply_constraint(&records, &prefix).unwrap();

        let names: Vec<String> = kept.column("NAMA SLS2").unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["AE Budi", "AE Budi", "AEX Dewi", "AE Budi"]);
    }

    #[test]
    fn test_prefix_is_case_sensitive_and_skips_nulls() {
        let records = sales();
        let prefix = Constraint::Prefix { column: "NAMA SLS2".into(), prefix: "ae".into() };
        let kept = apply_constraint(&records, &prefix).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_membership_compares_string_forms() {
        let records = sales();
        let kept = apply_constraint(&records, &membership("KD_BRG", &["303174"])).unwrap();
        assert_eq!(kept.len(), 4);
        assert!(kept.column("KD_BRG").unwrap().iter().all(|c| *c == CellValue::Int(303174)));
    }

    #[test]
    fn test_membership_keeps_row_order_and_columns() {
        let records = sales();
        let kept = apply_constraint(&records, &membership("CHANNEL", &["MT"])).unwrap();
        assert_eq!(outlets(&kept), vec!["O1", "O3"]);
        assert_eq!(kept.column_names(), records.column_names());
    }

    #[test]
    fn test_membership_filters_commute() {
        let records = sales();
        let a = membership("CHANNEL", &["GT"]);
        let b = membership("KD_BRG", &["303174", "100200"]);

        let ab = apply_constraint(&apply_constraint(&records, &a).unwrap(), &b).unwrap();
        let ba = apply_constraint(&apply_constraint(&records, &b).unwrap(), &a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_threshold_runs_before_memberships() {
        let records = sales();
        let channel = membership("CHANNEL", &["GT"]);
        let qty = threshold(Comparison::GreaterThan, 2.0);

        // Evaluation order puts the threshold first whatever the insertion order
        let spec = FilterSpec::new().with(channel.clone()).with(qty.clone());
        let outcome = apply_filters(&records, &spec);
        assert_eq!(outlets(&outcome.records), vec!["O2", "O3"]);

        // Narrowing by channel first shrinks O3 to 0.5 and drops it
        let swapped = apply_constraint(&apply_constraint(&records, &channel).unwrap(), &qty).unwrap();
        assert_eq!(outlets(&swapped), vec!["O2"]);
        assert_ne!(outcome.records, swapped);
    }

    #[test]
    fn test_missing_membership_column_is_noop_with_warning() {
        let records = sales();
        let spec = FilterSpec::new().with(membership("RUTE", &["R01"]));

        let outcome = apply_filters(&records, &spec);
        assert_eq!(outcome.records, records);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].to_string().contains("RUTE"));
    }

    #[test]
    fn test_all_filters_together() {
        let records = sales();
        let spec = FilterSpec::from_entries(
            &[
                ("KD_BRG".to_string(), vec!["303174".to_string()]),
                ("QTY".to_string(), vec![">2".to_string()]),
                ("NAMA_SLS2_AWAL".to_string(), vec!["AE".to_string()]),
            ],
            &Schema::default(),
        )
        .unwrap();

        // Threshold keeps O2, O3; prefix keeps the AEX row of O3; KD_BRG 100200 drops it
        let outcome = apply_filters(&records, &spec);
        assert!(outcome.records.is_empty());
    }
}
