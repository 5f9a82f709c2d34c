//! Report pipeline: filter, then aggregate.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_report::{load_dataset, run_report, AggregateSpec, FilterSpec, ReportOptions, ReportStatus};
//!
//! let records = load_dataset("dbase.parquet")?;
//! let filters = FilterSpec::from_entries(&entries, &options.schema)?;
//! let spec = AggregateSpec::new(vec!["PMA".into(), "NAMA SLS2".into()]);
//!
//! match run_report(&records, &filters, spec, &ReportOptions::default())? {
//!     ReportStatus::Ready(report) => println!("{} groups", report.table.len()),
//!     ReportStatus::Empty(stage) => println!("nothing left after {stage}"),
//! }
//! ```

use serde::Serialize;
use std::fmt;

use super::aggregate::{aggregate, AggregateSpec, ResultTable};
use super::constraint::FilterSpec;
use super::filter::{apply_filters, SchemaWarning};
use crate::error::ConfigResult;
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{RecordSet, Schema};

/// Options for a report run.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub schema: Schema,
    /// Re-apply the quantity threshold to each group after aggregation.
    pub recheck_threshold: bool,
}

/// Stage that left nothing to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyStage {
    Filtering,
    Grouping,
}

impl fmt::Display for EmptyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyStage::Filtering => f.write_str("filtering"),
            EmptyStage::Grouping => f.write_str("grouping"),
        }
    }
}

/// A finished report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub table: ResultTable,
    /// Rows left after filtering.
    pub filtered_rows: usize,
    /// Grouping columns actually used.
    pub group_columns: Vec<String>,
    pub warnings: Vec<SchemaWarning>,
}

/// Outcome of a run that did not hit a configuration error.
#[derive(Debug, Clone)]
pub enum ReportStatus {
    Ready(Report),
    /// Nothing to display; no export should be attempted.
    Empty(EmptyStage),
}

/// Filter `records` and aggregate what is left.
pub fn run_report(
    records: &RecordSet,
    filters: &FilterSpec,
    aggregation: AggregateSpec,
    options: &ReportOptions,
) -> ConfigResult<ReportStatus> {
    log_info(format!("🔎 Filtering {} rows ({} constraints)...", records.len(), filters.constraints().len()));
    let filtered = apply_filters(records, filters);
    let mut warnings = filtered.warnings;

    if filtered.records.is_empty() {
        log_warning("No rows left after filtering");
        return Ok(ReportStatus::Empty(EmptyStage::Filtering));
    }
    log_success(format!("{} rows left after filtering", filtered.records.len()));

    let recheck = if options.recheck_threshold { filters.threshold().cloned() } else { None };
    let aggregation = aggregation.with_recheck(recheck);

    log_info(format!("📦 Grouping by {}...", aggregation.group_by.join(", ")));
    let result = aggregate(&filtered.records, &aggregation, &options.schema)?;
    warnings.extend(result.warnings);

    if result.table.is_empty() {
        log_warning("No groups left after aggregation");
        return Ok(ReportStatus::Empty(EmptyStage::Grouping));
    }
    log_success(format!("{} groups", result.table.len()));

    Ok(ReportStatus::Ready(Report {
        table: result.table,
        filtered_rows: filtered.records.len(),
        group_columns: result.group_columns,
        warnings,
    }))
}
