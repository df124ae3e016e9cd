//! Rendering of table rows for the terminal.

use crate::qso::Column;
use crate::table::Row;

use super::OutputFormat;

/// Render rows in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_rows<'a>(
    rows: impl IntoIterator<Item = &'a Row>,
    format: OutputFormat,
) -> serde_json::Result<String> {
    let rows: Vec<&Row> = rows.into_iter().collect();
    match format {
        OutputFormat::Plain => Ok(render_plain(&rows)),
        OutputFormat::Table => Ok(render_table(&rows)),
        OutputFormat::Json => serde_json::to_string_pretty(&rows),
    }
}

fn render_plain(rows: &[&Row]) -> String {
    rows.iter()
        .map(|row| {
            Column::ALL
                .into_iter()
                .map(|column| row.display(column))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_table(rows: &[&Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| Column::ALL.into_iter().map(|c| row.display(c)).collect())
        .collect();
    let widths: Vec<usize> = Column::ALL
        .into_iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|line| line[i].chars().count())
                .chain(std::iter::once(column.header().len()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(pad_line(&Column::ALL.map(Column::header), &widths));
    let rules: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    lines.push(pad_line(&rules, &widths));
    for line in &cells {
        lines.push(pad_line(line, &widths));
    }
    lines.join("\n")
}

fn pad_line<S: AsRef<str>>(values: &[S], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(value, &width)| format!("{:<width$}", value.as_ref()))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
