//! # Sales Report - filter and aggregate sales transaction datasets
//!
//! Reads a columnar dataset of sales transactions, narrows it with
//! declarative column filters, groups the rest by the chosen columns and
//! produces a terminal report plus an optional xlsx export with a totals block.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Dataset   │────▶│   Filter    │────▶│  Aggregate  │────▶│ Terminal /  │
//! │ (parquet/   │     │ (threshold, │     │ (group, sum │     │ xlsx export │
//! │  csv)       │     │  prefix, in)│     │  & format)  │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sales_report::{load_dataset, run_report, AggregateSpec, ReportConfig, ReportOptions, ReportStatus};
//!
//! let options = ReportOptions::default();
//! let config = ReportConfig::load(Path::new("."), &options.schema, None)?;
//! let records = load_dataset(&config.dataset)?;
//! let spec = AggregateSpec::new(config.group_columns).with_display(config.display_columns);
//!
//! if let ReportStatus::Ready(report) = run_report(&records, &config.filters, spec, &options)? {
//!     println!("{} groups", report.table.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`logs`] - Broadcast logger
//! - [`models`] - Cells, record sets and the column schema
//! - [`parser`] - Dataset loading (parquet, csv)
//! - [`config`] - `filter.txt` / `kolom.txt` / `lokasi_dbase.txt`
//! - [`transform`] - Filter engine, aggregation and formatting
//! - [`view`] - Terminal table
//! - [`export`] - xlsx and JSON export
//! - [`prompt`] - Timed export confirmation
//! - [`update`] - Remote version check

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Inputs
pub mod config;
pub mod parser;

// Engine
pub mod transform;

// Outputs
pub mod export;
pub mod prompt;
pub mod view;

// Version check
pub mod update;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ConfigResult,
    ExportError,
    ExportResult,
    LoadError,
    LoadResult,
    ReportError,
    ReportResult,
    UpdateError,
    UpdateResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, Column, RecordSet, Schema};

// =============================================================================
// Re-exports - Loading & Configuration
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    load_dataset,
    parse_bytes_auto,
    parse_csv,
    parse_csv_file_auto,
};

pub use config::{parse_column_text, parse_filter_text, ReportConfig};

// =============================================================================
// Re-exports - Engine
// =============================================================================

pub use transform::{
    aggregate,
    apply_constraint,
    apply_filters,
    format_grouped,
    format_quantity,
    format_value,
    run_report,
    AggregateSpec,
    Aggregation,
    Comparison,
    Constraint,
    DisplayRow,
    EmptyStage,
    FilterOutcome,
    FilterSpec,
    FormatPolicy,
    Report,
    ReportOptions,
    ReportStatus,
    ResultTable,
    SchemaWarning,
    Threshold,
};

// =============================================================================
// Re-exports - Outputs
// =============================================================================

pub use export::{export_json, export_path, export_xlsx, layout_table, SheetLayout};
pub use prompt::{confirm_export, Prompter, StdinPrompter};
pub use view::{print_report, render_table, render_totals, ViewOptions};

// =============================================================================
// Re-exports - Update check
// =============================================================================

pub use update::{compare_versions, report_update_status, HttpUpdateChecker, UpdateChecker, UpdateStatus};
