//! Error types for the sales report run.
//!
//! The hierarchy mirrors the stages of a run:
//!
//! - [`ConfigError`] - Malformed filter/column configuration (fatal)
//! - [`LoadError`] - Missing or unreadable inputs (fatal, before the core runs)
//! - [`ExportError`] - Spreadsheet writing failures
//! - [`UpdateError`] - Version check failures (always downgraded to a warning)
//! - [`ReportError`] - Top-level error returned by the pipeline and the CLI
//!
//! Schema mismatches and empty results are not errors: they surface as
//! [`crate::transform::SchemaWarning`] and [`crate::transform::ReportStatus::Empty`].

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in the declarative filter / grouping configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Threshold expression uses an operator other than `>` or `<`.
    #[error("Unsupported threshold operator in '{0}': only '>' or '<' are allowed")]
    UnsupportedOperator(String),

    /// Threshold magnitude is missing or not a number.
    #[error("Invalid threshold magnitude in '{0}': expected a number after the operator")]
    InvalidMagnitude(String),

    /// None of the requested grouping columns exist in the filtered data.
    #[error("No valid grouping columns (requested: {})", .requested.join(", "))]
    NoValidGroupingColumns { requested: Vec<String> },

    /// The column selection file selected nothing.
    #[error("No columns selected in {0}")]
    EmptyColumnSelection(PathBuf),

    /// Failed to read a configuration file.
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while locating or reading the dataset and its config files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Required input file does not exist.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV content.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// CSV has no header row.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Parquet / Arrow decoding failed.
    #[error("Invalid parquet file: {0}")]
    Parquet(String),

    /// Unknown dataset extension.
    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(PathBuf),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing the spreadsheet.
#[derive(Debug, Error)]
pub enum ExportError {
    /// rust_xlsxwriter failure.
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Display table has more columns than a sheet can hold.
    #[error("Too many columns for a worksheet: {0}")]
    TooManyColumns(usize),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Update Check Errors
// =============================================================================

/// Errors from the version checker.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("Unexpected status {0}")]
    Status(u16),

    /// Version file was empty.
    #[error("Remote version file is empty")]
    EmptyVersion,
}

// =============================================================================
// Report Errors (top-level)
// =============================================================================

/// Top-level error for a report run.
///
/// Wraps the lower-level errors so `?` works from the CLI down to the engine.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Missing or unreadable input.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration parsing.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for dataset loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for spreadsheet export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for update checks.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Result type for a whole run.
pub type ReportResult<T> = Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let config_err = ConfigError::UnsupportedOperator("=5".into());
        let report_err: ReportError = config_err.into();
        assert!(report_err.to_string().contains("=5"));

        let load_err = LoadError::NotFound(PathBuf::from("dbase.parquet"));
        let report_err: ReportError = load_err.into();
        assert!(report_err.to_string().contains("dbase.parquet"));
    }

    #[test]
    fn test_no_grouping_columns_lists_requested() {
        let err = ConfigError::NoValidGroupingColumns {
            requested: vec!["PMA".into(), "RUTE".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("PMA, RUTE"));
    }
}
