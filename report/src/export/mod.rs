//! Spreadsheet and JSON export of a result table.
//!
//! The xlsx sheet `Data` holds the header row, one row per group, a blank
//! row, then the totals block:
//!
//! ```text
//! row 0        PMA | NAMA SLS2 | QTY_fmt | VALUE_fmt
//! rows 1..=n   ...
//! row n+2      TOTAL QTY   | 1,239.5
//! row n+3      TOTAL VALUE | 2,650
//! ```
//!
//! The layout is computed first ([`layout_table`]) and then written with
//! `rust_xlsxwriter`, so it can be checked without opening a workbook.

use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, ExportResult};
use crate::models::CellValue;
use crate::transform::ResultTable;

pub const SHEET_NAME: &str = "Data";
pub const DEFAULT_EXPORT_NAME: &str = "hasil_export";
pub const QUANTITY_NUM_FORMAT: &str = "#,##0.0";
pub const VALUE_NUM_FORMAT: &str = "#,##0";
pub const TOTAL_QUANTITY_LABEL: &str = "TOTAL QTY";
pub const TOTAL_VALUE_LABEL: &str = "TOTAL VALUE";

/// Extra characters added to the widest cell of each column.
const WIDTH_PADDING: usize = 5;

/// Columns available on one worksheet.
const MAX_COLUMNS: usize = 16_384;

// =============================================================================
// Layout
// =============================================================================

/// Number format applied to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberStyle {
    Quantity,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetValue {
    Header(String),
    Text(String),
    Number(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    pub row: u32,
    pub col: u16,
    pub value: SheetValue,
    pub style: Option<NumberStyle>,
}

/// Cells and column widths of the export sheet. Null cells are left blank.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub cells: Vec<SheetCell>,
    pub column_widths: Vec<f64>,
}

impl SheetLayout {
    pub fn cell(&self, row: u32, col: u16) -> Option<&SheetCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}

fn key_value(cell: &CellValue) -> Option<SheetValue> {
    match cell {
        CellValue::Null => None,
        CellValue::Bool(b) => Some(SheetValue::Bool(*b)),
        CellValue::Int(i) => Some(SheetValue::Number(*i as f64)),
        CellValue::Float(f) => Some(SheetValue::Number(*f)),
        CellValue::Text(s) => Some(SheetValue::Text(s.clone())),
    }
}

/// Place every cell of `table` on the sheet.
///
/// Key columns keep their type. The two formatted measures are written as
/// numbers carrying the display format, so they read like the terminal
/// strings but stay numeric.
pub fn layout_table(table: &ResultTable) -> ExportResult<SheetLayout> {
    let header = table.header();
    if header.len() > MAX_COLUMNS {
        return Err(ExportError::TooManyColumns(header.len()));
    }
    let key_count = table.columns.len();

    let mut cells = Vec::with_capacity((table.len() + 1) * header.len() + 4);
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();

    for (col, name) in header.iter().enumerate() {
        cells.push(SheetCell {
            row: 0,
            col: col as u16,
            value: SheetValue::Header(name.to_string()),
            style: None,
        });
    }

    for (index, row) in table.rows.iter().enumerate() {
        let sheet_row = index as u32 + 1;

        for (col, cell) in row.cells.iter().enumerate() {
            widths[col] = widths[col].max(cell.to_string().chars().count());
            if let Some(value) = key_value(cell) {
                cells.push(SheetCell {
                    row: sheet_row,
                    col: col as u16,
                    value,
                    style: None,
                });
            }
        }

        let measures = [
            (row.quantity, &row.quantity_fmt, NumberStyle::Quantity),
            (row.value, &row.value_fmt, NumberStyle::Value),
        ];
        for (offset, (number, formatted, style)) in measures.into_iter().enumerate() {
            let col = key_count + offset;
            widths[col] = widths[col].max(formatted.chars().count());
            cells.push(SheetCell {
                row: sheet_row,
                col: col as u16,
                value: SheetValue::Number(number),
                style: Some(style),
            });
        }
    }

    let totals_row = table.len() as u32 + 2;
    let totals = [
        (TOTAL_QUANTITY_LABEL, table.total_quantity, NumberStyle::Quantity),
        (TOTAL_VALUE_LABEL, table.total_value, NumberStyle::Value),
    ];
    for (offset, (label, number, style)) in totals.into_iter().enumerate() {
        let row = totals_row + offset as u32;
        cells.push(SheetCell {
            row,
            col: 0,
            value: SheetValue::Text(label.to_string()),
            style: None,
        });
        cells.push(SheetCell {
            row,
            col: 1,
            value: SheetValue::Number(number),
            style: Some(style),
        });
    }

    Ok(SheetLayout {
        cells,
        column_widths: widths.into_iter().map(|w| (w + WIDTH_PADDING) as f64).collect(),
    })
}

// =============================================================================
// Writers
// =============================================================================

/// Normalize a user-supplied export name: blank becomes
/// [`DEFAULT_EXPORT_NAME`] and `.xlsx` is appended when missing.
pub fn export_path(name: &str) -> PathBuf {
    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_EXPORT_NAME } else { name };

    if name.to_ascii_lowercase().ends_with(".xlsx") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}.xlsx", name))
    }
}

/// Write `table` and its totals to an xlsx workbook at `path`.
pub fn export_xlsx(table: &ResultTable, path: &Path) -> ExportResult<()> {
    let layout = layout_table(table)?;

    let header_format = Format::new().set_bold();
    let quantity_format = Format::new().set_num_format(QUANTITY_NUM_FORMAT);
    let value_format = Format::new().set_num_format(VALUE_NUM_FORMAT);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, width) in layout.column_widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    for cell in &layout.cells {
        let (row, col) = (cell.row, cell.col);
        match (&cell.value, cell.style) {
            (SheetValue::Header(s), _) => {
                worksheet.write_string_with_format(row, col, s, &header_format)?;
            }
            (SheetValue::Text(s), _) => {
                worksheet.write_string(row, col, s)?;
            }
            (SheetValue::Bool(b), _) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            (SheetValue::Number(n), Some(NumberStyle::Quantity)) => {
                worksheet.write_number_with_format(row, col, *n, &quantity_format)?;
            }
            (SheetValue::Number(n), Some(NumberStyle::Value)) => {
                worksheet.write_number_with_format(row, col, *n, &value_format)?;
            }
            (SheetValue::Number(n), None) => {
                worksheet.write_number(row, col, *n)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Write any serializable report as pretty JSON.
pub fn export_json<T: Serialize>(report: &T, path: &Path) -> ExportResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}
