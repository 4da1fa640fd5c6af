//! Terminal rendering of `/ask` and `/health` responses.

use owo_colors::OwoColorize;
use sqlsage_shared::presentation::{render_rows, result_status, truncate_schema, ResultStatus};
use sqlsage_shared::{AskResponse, HealthResponse, NO_MATCHING_RECORDS};

/// Width the answer paragraph is wrapped to
const WRAP_WIDTH: usize = 88;

#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub color: bool,
}

impl Style {
    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn error(&self, text: &str) -> String {
        if self.color {
            text.bright_red().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Full text of an `/ask` response: answer first, then the intermediate steps
pub fn format_response(response: &AskResponse, style: Style) -> String {
    let mut out = Vec::new();

    match (&response.error_message, &response.natural_language_answer) {
        (Some(error), _) => out.push(format!("{} {}", style.error("[ERROR]"), error)),
        (None, Some(answer)) => out.push(textwrap::fill(answer, WRAP_WIDTH)),
        (None, None) => out.push(style.dim("(no answer)")),
    }

    let steps = &response.intermediate_steps;

    out.push(String::new());
    out.push(style.heading("[SCHEMA]"));
    out.push(match &steps.relevant_schema {
        Some(schema) => truncate_schema(schema),
        None => style.dim("(none)"),
    });

    out.push(String::new());
    out.push(style.heading("[SQL]"));
    out.push(match &steps.generated_sql_query {
        Some(sql) => sql.clone(),
        None => style.dim("(none)"),
    });

    out.push(String::new());
    out.push(style.heading("[RESULTS]"));
    match result_status(response) {
        ResultStatus::Rows(preview) => out.push(render_rows(&preview)),
        ResultStatus::NoMatch => out.push(NO_MATCHING_RECORDS.to_string()),
        ResultStatus::ExecutionFailed(error) => out.push(style.error(error)),
        ResultStatus::NotRun => out.push(style.dim("(not run)")),
    }

    out.join("\n")
}

pub fn format_health(health: &HealthResponse, url: &str, style: Style) -> String {
    [
        format!("{} {}", style.heading("[DAEMON]"), url),
        format!("  status    {}", health.status),
        format!("  version   {}", health.version),
        format!("  uptime    {}s", health.uptime_seconds),
        format!("  database  {}", health.database),
        format!("  model     {}", health.model),
    ]
    .join("\n")
}
