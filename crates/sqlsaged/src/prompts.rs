//! Prompt building for the SQL and answer stages.
//!
//! Both builders are pure: the same inputs always give the same prompt.

use crate::context::ExecutionOutcome;
use chrono::{Datelike, NaiveDate};
use sqlsage_shared::{Row, NO_MATCHING_RECORDS};

/// SQLite dialect rules for the SQL stage (constant, always included)
const SQL_RULES: &str = r#"=== RULES ===
1. Use only the tables and columns listed in the schema.
2. Dates are stored as TEXT. Compare them with date(), datetime() and strftime().
3. Quarters: Q1 is 01-01..03-31, Q2 04-01..06-30, Q3 07-01..09-30, Q4 10-01..12-31.
4. "last N days": column >= date('now', '-N days'). "yesterday": date(column) = date('now', '-1 day').
5. Join on the foreign keys shown in the schema.
6. With SUM, AVG or COUNT, GROUP BY every selected column that is not aggregated.
7. Give aggregates a short alias, e.g. COUNT(*) AS count.
8. If the question is ambiguous, make a reasonable assumption and still write the query.
9. Return exactly one SQL statement and nothing else. No explanations, no markdown, no code fences."#;

const SQL_EXAMPLES: &str = r#"=== EXAMPLES ===
Question: How many customers do we have?
SQL: SELECT COUNT(*) AS count FROM customers;

Question: Who are the three highest paid employees?
SQL: SELECT first_name, last_name, salary FROM employees ORDER BY salary DESC LIMIT 3;

Question: What was the total value of orders placed in Q2 2023?
SQL: SELECT SUM(oi.quantity * oi.price_at_purchase) AS total FROM order_items oi JOIN orders o ON oi.order_id = o.order_id WHERE o.order_date BETWEEN '2023-04-01 00:00:00' AND '2023-06-30 23:59:59';"#;

/// Rules for the answer stage (constant, always included)
const ANSWER_RULES: &str = r#"=== RULES ===
- If there are no results, say that no matching records were found.
- If the query failed, explain the failure in plain language and suggest how the question could be asked differently.
- For a single number (COUNT, SUM, AVG), state it directly, e.g. "There are 12 orders."
- For several rows, summarise them or list a few. Do not dump the whole table.
- Use only the results above. Be concise and polite."#;

/// Build the prompt asking the model for one SQL statement
pub fn build_sql_prompt(schema: &str, question: &str, today: NaiveDate) -> String {
    let year = today.year();
    format!(
        "You are an expert SQLite query writer. Write one query that answers the question \
         using the database schema below.\n\n\
         === SCHEMA ===\n{schema}\n\n\
         {rules}\n\
         10. Today is {today}. \"this year\": strftime('%Y', column) = '{year}'. \
         \"last year\": strftime('%Y', column) = '{last_year}'.\n\n\
         {examples}\n\n\
         Question: {question}\n\
         SQL:",
        schema = schema.trim_end(),
        rules = SQL_RULES,
        today = today.format("%Y-%m-%d"),
        year = year,
        last_year = year - 1,
        examples = SQL_EXAMPLES,
        question = question,
    )
}

/// Build the prompt asking the model to explain the outcome
pub fn build_answer_prompt(
    question: &str,
    sql: &str,
    outcome: &ExecutionOutcome,
    max_rows: usize,
) -> String {
    format!(
        "You turn SQL query results into a short natural-language answer for the person \
         who asked the question.\n\n\
         Original question: {question}\n\
         SQL query: {sql}\n\
         Query results:\n{results}\n\n\
         {rules}\n\n\
         Answer:",
        question = question,
        sql = sql,
        results = render_results(outcome, max_rows),
        rules = ANSWER_RULES,
    )
}

/// Compact rendering of an execution outcome for the answer prompt
pub fn render_results(outcome: &ExecutionOutcome, max_rows: usize) -> String {
    match outcome {
        ExecutionOutcome::Failed(error) => {
            format!("An error occurred during SQL execution: {}", error)
        }
        ExecutionOutcome::Rows(rows) if rows.is_empty() => NO_MATCHING_RECORDS.to_string(),
        ExecutionOutcome::Rows(rows) => {
            let shown = rows.len().min(max_rows);
            let mut rendered = rows_json(&rows[..shown]);
            if rows.len() > shown {
                rendered.push_str(&format!("\n... (and {} more rows)", rows.len() - shown));
            }
            rendered
        }
    }
}

fn rows_json(rows: &[Row]) -> String {
    serde_json::to_string_pretty(rows).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn row(n: i64) -> Row {
        json!({ "n": n }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_sql_prompt_embeds_schema_question_and_dates() {
        let prompt = build_sql_prompt("employees(id INTEGER, dept TEXT)\n", "How many?", today());
        assert!(prompt.contains("=== SCHEMA ===\nemployees(id INTEGER, dept TEXT)\n\n"));
        assert!(prompt.contains("Today is 2024-03-15"));
        assert!(prompt.contains("'2024'"));
        assert!(prompt.contains("'2023'"));
        assert!(prompt.ends_with("Question: How many?\nSQL:"));
        assert!(prompt.contains("exactly one SQL statement"));
    }

    #[test]
    fn test_sql_prompt_is_deterministic() {
        assert_eq!(
            build_sql_prompt("s", "q", today()),
            build_sql_prompt("s", "q", today())
        );
    }

    #[test]
    fn test_render_results_caps_rows() {
        let rows: Vec<Row> = (0..25).map(row).collect();
        let rendered = render_results(&ExecutionOutcome::Rows(rows), 20);
        assert!(rendered.contains("\"n\": 19"));
        assert!(!rendered.contains("\"n\": 20"));
        assert!(rendered.ends_with("... (and 5 more rows)"));
    }

    #[test]
    fn test_render_results_empty_and_error() {
        assert_eq!(
            render_results(&ExecutionOutcome::Rows(vec![]), 20),
            NO_MATCHING_RECORDS
        );
        assert_eq!(
            render_results(&ExecutionOutcome::Failed("no such column: salary".into()), 20),
            "An error occurred during SQL execution: no such column: salary"
        );
    }

    #[test]
    fn test_answer_prompt_embeds_everything() {
        let prompt = build_answer_prompt(
            "How many employees are in Sales?",
            "SELECT COUNT(*) AS count FROM employees WHERE dept = 'Sales'",
            &ExecutionOutcome::Rows(vec![json!({"count": 3}).as_object().cloned().unwrap()]),
            20,
        );
        assert!(prompt.contains("Original question: How many employees are in Sales?"));
        assert!(prompt.contains("SQL query: SELECT COUNT(*) AS count"));
        assert!(prompt.contains("\"count\": 3"));
        assert!(prompt.ends_with("Answer:"));
    }
}
