//! Plain-text rendering of a [`Table`] prefix for the `detect` command.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::table::Table;

const NULL_DISPLAY: &str = "NULL";

pub fn render_table(table: &Table, max_rows: usize) -> String {
    let rows = table
        .rows
        .iter()
        .take(max_rows)
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_deref().unwrap_or(NULL_DISPLAY))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = table
        .columns
        .iter()
        .map(|h| display_width(h).max(1))
        .collect::<Vec<_>>();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let headers = table.columns.iter().map(String::as_str).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&headers, &widths));

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let separator_refs = separator_cells
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_refs, &separator_widths));

    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }

    output
}

fn format_row(values: &[&str], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
