//! Display rules for `/ask` responses.
//!
//! The web page and `sqlsagectl ask` both follow these: schema text is cut at
//! [`SCHEMA_DISPLAY_LIMIT`] characters, at most [`ROW_DISPLAY_LIMIT`] rows are
//! shown, and an empty result without any error reads as "no matching records".
//! The daemon always returns the full data; truncation happens only here.

use crate::rpc::{AskResponse, Row};
use serde_json::Value;

pub const SCHEMA_DISPLAY_LIMIT: usize = 1000;
pub const ROW_DISPLAY_LIMIT: usize = 10;

/// Leading rows to show plus how many were held back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPreview<'a> {
    pub rows: &'a [Row],
    pub remaining: usize,
}

impl RowPreview<'_> {
    /// "... and N more rows", when rows were held back
    pub fn remaining_label(&self) -> Option<String> {
        match self.remaining {
            0 => None,
            1 => Some("... and 1 more row".to_string()),
            n => Some(format!("... and {} more rows", n)),
        }
    }
}

/// What the result section of a response should show
#[derive(Debug, Clone, PartialEq)]
pub enum ResultStatus<'a> {
    /// The query returned rows
    Rows(RowPreview<'a>),
    /// The query ran and matched nothing
    NoMatch,
    /// The database rejected the query
    ExecutionFailed(&'a str),
    /// The pipeline stopped before execution
    NotRun,
}

/// Schema text cut to the display limit, with an ellipsis when cut
pub fn truncate_schema(schema: &str) -> String {
    match schema.char_indices().nth(SCHEMA_DISPLAY_LIMIT) {
        Some((cut, _)) => format!("{}...", &schema[..cut]),
        None => schema.to_string(),
    }
}

pub fn preview_rows(rows: &[Row]) -> RowPreview<'_> {
    let shown = rows.len().min(ROW_DISPLAY_LIMIT);
    RowPreview {
        rows: &rows[..shown],
        remaining: rows.len() - shown,
    }
}

pub fn result_status(response: &AskResponse) -> ResultStatus<'_> {
    let steps = &response.intermediate_steps;
    if let Some(error) = steps.execution_error.as_deref() {
        return ResultStatus::ExecutionFailed(error);
    }
    match steps.result_rows.as_deref() {
        // Zero rows is a result even when the answer step failed afterwards
        Some([]) => ResultStatus::NoMatch,
        None => ResultStatus::NotRun,
        Some(rows) => ResultStatus::Rows(preview_rows(rows)),
    }
}

/// Cell text: strings unquoted, null as `NULL`, everything else as JSON
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Plain-text table of a row preview, header taken from the first row
pub fn render_rows(preview: &RowPreview<'_>) -> String {
    let Some(first) = preview.rows.first() else {
        return String::new();
    };

    let columns: Vec<&String> = first.keys().collect();
    let cells: Vec<Vec<String>> = preview
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| row.get(col.as_str()).map(format_value).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_line(columns.iter().map(|c| c.as_str()).collect())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &cells {
        lines.push(format_line(row.iter().map(String::as_str).collect()));
    }
    if let Some(label) = preview.remaining_label() {
        lines.push(label);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "NULL");
        assert_eq!(format_value(&json!("Sales")), "Sales");
        assert_eq!(format_value(&json!(3)), "3");
        assert_eq!(format_value(&json!(2.5)), "2.5");
    }

    #[test]
    fn test_render_rows_aligns_columns() {
        let rows = vec![
            row(json!({"name": "Ada", "dept": "Engineering"})),
            row(json!({"name": "Bartholomew", "dept": "HR"})),
        ];
        let rendered = render_rows(&preview_rows(&rows));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "name        | dept");
        assert_eq!(lines[2], "Ada         | Engineering");
        assert_eq!(lines[3], "Bartholomew | HR");
    }

    #[test]
    fn test_render_rows_empty() {
        assert_eq!(render_rows(&preview_rows(&[])), "");
    }
}
