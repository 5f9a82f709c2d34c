//! Text configuration for a report run.
//!
//! A config directory holds plain `key=value` files:
//!
//! | File               | Content                                          |
//! |--------------------|--------------------------------------------------|
//! | `filter.txt`       | `COLUMN=v1,v2` filters, `QTY=>2`, `NAMA_SLS2_AWAL=AE` |
//! | `kolom.txt`        | `COLUMN=Y` selects a display column              |
//! | `group.txt`        | optional, same format, grouping columns          |
//! | `lokasi_dbase.txt` | path of the dataset file                         |
//!
//! Lines starting with `#` and lines without `=` are ignored.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, LoadError, ReportResult};
use crate::models::Schema;
use crate::transform::FilterSpec;

pub const FILTER_FILE: &str = "filter.txt";
pub const COLUMN_FILE: &str = "kolom.txt";
pub const GROUP_FILE: &str = "group.txt";
pub const DATASET_LOCATION_FILE: &str = "lokasi_dbase.txt";

/// Environment variable overriding the dataset path.
pub const DATASET_ENV: &str = "SALES_REPORT_DATASET";

/// Everything a run needs besides the dataset itself.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub filters: FilterSpec,
    /// Display columns, in file order.
    pub display_columns: Vec<String>,
    /// Grouping columns; the non-measure display columns unless `group.txt` exists.
    pub group_columns: Vec<String>,
    pub dataset: PathBuf,
}

impl ReportConfig {
    /// Load the config files from `dir`.
    pub fn load(dir: &Path, schema: &Schema, dataset_override: Option<PathBuf>) -> ReportResult<Self> {
        let entries = read_filter_file(dir.join(FILTER_FILE))?;
        let filters = FilterSpec::from_entries(&entries, schema)?;

        let column_path = dir.join(COLUMN_FILE);
        let display_columns = read_column_file(&column_path)?;
        if display_columns.is_empty() {
            return Err(ConfigError::EmptyColumnSelection(column_path).into());
        }
        let group_path = dir.join(GROUP_FILE);
        let group_columns = if group_path.is_file() {
            read_column_file(group_path)?
        } else {
            display_columns
                .iter()
                .filter(|column| !schema.is_measure(column))
                .cloned()
                .collect()
        };

        let dataset = resolve_dataset(dir, dataset_override)?;

        Ok(Self {
            filters,
            display_columns,
            group_columns,
            dataset,
        })
    }
}

/// Dataset path: `dataset_override`, then the `SALES_REPORT_DATASET`
/// environment variable, then `lokasi_dbase.txt` in `dir`.
pub fn resolve_dataset(dir: &Path, dataset_override: Option<PathBuf>) -> ReportResult<PathBuf> {
    match dataset_override.or_else(|| env::var_os(DATASET_ENV).map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => read_dataset_location(dir.join(DATASET_LOCATION_FILE)),
    }
}

fn read_config<P: AsRef<Path>>(path: P) -> ReportResult<String> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()).into());
    }
    fs::read_to_string(path).map_err(|source| {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Split a config line into trimmed key and value.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    line.split_once('=').map(|(k, v)| (k.trim(), v.trim()))
}

/// Parse filter entries. Comma-separated values become a list; blank values
/// an empty list.
pub fn parse_filter_text(content: &str) -> Vec<(String, Vec<String>)> {
    content
        .lines()
        .filter_map(split_entry)
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| {
            let values = value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            (key.to_string(), values)
        })
        .collect()
}

/// Parse a `COLUMN=Y/N` selection, keeping the `Y` columns in file order.
pub fn parse_column_text(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(split_entry)
        .filter(|(key, value)| !key.is_empty() && value.eq_ignore_ascii_case("y"))
        .map(|(key, _)| key.to_string())
        .collect()
}

pub fn read_filter_file<P: AsRef<Path>>(path: P) -> ReportResult<Vec<(String, Vec<String>)>> {
    Ok(parse_filter_text(&read_config(path)?))
}

pub fn read_column_file<P: AsRef<Path>>(path: P) -> ReportResult<Vec<String>> {
    Ok(parse_column_text(&read_config(path)?))
}

/// Read the dataset path. Relative paths are resolved against the file's directory.
pub fn read_dataset_location<P: AsRef<Path>>(path: P) -> ReportResult<PathBuf> {
    let path = path.as_ref();
    let location = PathBuf::from(read_config(path)?.trim());
    if location.as_os_str().is_empty() {
        return Err(LoadError::NotFound(path.to_path_buf()).into());
    }

    match path.parent() {
        Some(parent) if location.is_relative() => Ok(parent.join(location)),
        _ => Ok(location),
    }
}
