//! Raw table view: the first rows of a dataset as aligned text.

use crate::models::Table;

/// Rows shown by the table view.
pub const PREVIEW_ROWS: usize = 25;

/// First `rows` rows of `table`.
pub fn preview(table: &Table, rows: usize) -> Table {
    table.head(rows)
}

fn pad_line<'a>(vals: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    vals.zip(widths.iter().copied())
        .map(|(v, w)| format!("{v:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Render a table as fixed-width text with a header rule.
pub fn render_text(table: &Table) -> String {
    let cells: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|r| r.iter().map(|v| v.to_string()).collect())
        .collect();
    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&pad_line(table.columns().iter().map(String::as_str), &widths));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for r in &cells {
        out.push_str(&pad_line(r.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}
