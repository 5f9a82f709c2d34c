//! Terminal rendering of the result table and its totals.

use crate::models::CellValue;
use crate::transform::{FormatPolicy, ResultTable};

/// Rows printed by default.
pub const DEFAULT_ROW_LIMIT: usize = 150;

/// Terminal view options.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    /// Maximum number of rows to print.
    pub limit: usize,
    /// Decimals for the totals lines; should match the aggregation's policy.
    pub format: FormatPolicy,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_ROW_LIMIT,
            format: FormatPolicy::default(),
        }
    }
}

fn cell_text(cell: &CellValue) -> String {
    if cell.is_null() {
        "-".to_string()
    } else {
        cell.to_string()
    }
}

/// Render the first `options.limit` rows as an aligned text table.
///
/// The first column is the row index; every column is right-aligned.
pub fn render_table(table: &ResultTable, options: &ViewOptions) -> String {
    let shown = table.len().min(options.limit);

    let mut header = vec![String::new()];
    header.extend(table.header().into_iter().map(String::from));

    let rows: Vec<Vec<String>> = table.rows[..shown]
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut cells = Vec::with_capacity(header.len());
            cells.push(index.to_string());
            cells.extend(row.cells.iter().map(cell_text));
            cells.push(row.quantity_fmt.clone());
            cells.push(row.value_fmt.clone());
            cells
        })
        .collect();

    // Compute column widths
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let render_line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:>width$}", value, width = *width))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_line(header.as_slice()));
    lines.extend(rows.iter().map(|row| render_line(row.as_slice())));

    let hidden = table.len() - shown;
    if hidden > 0 {
        lines.push(format!("... ({} more rows)", hidden));
    }

    lines.join("\n")
}

/// Render the two totals lines.
pub fn render_totals(table: &ResultTable, options: &ViewOptions) -> String {
    format!(
        "Total QTY   : {}\nTotal VALUE : {}",
        options.format.quantity(table.total_quantity),
        options.format.value(table.total_value)
    )
}

/// Print the table followed by the totals.
pub fn print_report(table: &ResultTable, options: &ViewOptions) {
    println!();
    println!("{}", render_table(table, options));
    println!();
    println!("{}", render_totals(table, options));
    println!();
}
