//! Tests for pipeline.rs: end-to-end scenarios over a real SQLite file.

use rusqlite::Connection;
use serde_json::json;
use sqlsage_shared::{Row, NO_MATCHING_RECORDS};
use sqlsaged::llm_client::{FakeLlmClient, LlmError};
use sqlsaged::store::{SqlStore, SqliteStore, StoreError, TableSchema};
use sqlsaged::{Pipeline, PipelineRun, PipelineState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

fn office_db(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("office.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE departments (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE employees (
             id INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             dept TEXT NOT NULL
         );
         INSERT INTO departments (name) VALUES ('Sales'), ('HR'), ('IT');
         INSERT INTO employees (name, dept) VALUES
             ('Alice', 'Sales'), ('Bob', 'Sales'), ('Carol', 'Sales'),
             ('Dan', 'HR'), ('Eve', 'IT');",
    )
    .unwrap();
    path
}

fn open_store(path: &Path) -> Arc<dyn SqlStore> {
    Arc::new(SqliteStore::open(path, true).unwrap())
}

fn run_with(llm: Arc<FakeLlmClient>, store: Arc<dyn SqlStore>, question: &str) -> PipelineRun {
    Pipeline::new(llm, store).run(question)
}

/// Store whose engine is down
struct UnavailableStore;

impl SqlStore for UnavailableStore {
    fn catalog(&self) -> Result<Vec<TableSchema>, StoreError> {
        Err(StoreError::Unavailable("database is locked".to_string()))
    }

    fn query(&self, _sql: &str) -> Result<Vec<Row>, StoreError> {
        Err(StoreError::Unavailable("database is locked".to_string()))
    }

    fn describe(&self) -> String {
        "unavailable".to_string()
    }
}

fn assert_exactly_one_outcome(run: &PipelineRun) {
    let ctx = &run.context;
    assert!(
        ctx.answer_text.is_some() != ctx.error_message.is_some(),
        "exactly one of answer/error must be set: {:?}",
        ctx
    );
    match run.state {
        PipelineState::Done => assert!(ctx.answer_text.is_some()),
        PipelineState::Failed => assert!(ctx.error_message.is_some()),
        other => panic!("non-terminal state {:?}", other),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_count_employees_in_sales() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));
    let llm = Arc::new(FakeLlmClient::with_completions([
        "```sql\nSELECT COUNT(*) AS count FROM employees WHERE dept = 'Sales';\n```",
        "There are 3 employees in the Sales department.",
    ]));

    let run = run_with(llm.clone(), store, "How many employees are in Sales?");

    assert_eq!(run.state, PipelineState::Done);
    assert_exactly_one_outcome(&run);

    let response = run.context.into_response();
    let steps = &response.intermediate_steps;
    assert_eq!(
        steps.generated_sql_query.as_deref(),
        Some("SELECT COUNT(*) AS count FROM employees WHERE dept = 'Sales'")
    );
    let expected: Vec<Row> = vec![json!({"count": 3}).as_object().cloned().unwrap()];
    assert_eq!(steps.result_rows.as_ref(), Some(&expected));
    assert!(steps.execution_error.is_none());
    assert!(steps.execution_message.is_none());
    assert!(response.natural_language_answer.unwrap().contains('3'));
    assert!(response.error_message.is_none());

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Question: How many employees are in Sales?"));
    assert!(prompts[1].contains("\"count\": 3"));
}

#[test]
fn test_nonexistent_column_is_explained() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));
    let llm = Arc::new(FakeLlmClient::with_completions([
        "SELECT salary FROM employees",
        "The employees table has no salary column, so salaries cannot be listed.",
    ]));

    let run = run_with(llm.clone(), store, "What are the salaries?");

    assert_eq!(run.state, PipelineState::Done);
    assert_exactly_one_outcome(&run);
    let response = run.context.into_response();
    let steps = &response.intermediate_steps;
    let error = steps.execution_error.as_deref().unwrap();
    assert!(error.starts_with("SQLite error: "));
    assert!(error.contains("no such column: salary"));
    assert!(steps.result_rows.is_none());
    assert!(response.error_message.is_none());
    assert!(!response.natural_language_answer.unwrap().is_empty());
    assert!(llm.prompts()[1].contains("An error occurred during SQL execution"));
}

#[test]
fn test_engine_outage_stops_at_schema() {
    let llm = Arc::new(FakeLlmClient::with_completions(["SELECT 1"]));
    let run = run_with(llm.clone(), Arc::new(UnavailableStore), "Anything?");

    assert_eq!(run.state, PipelineState::Failed);
    assert_exactly_one_outcome(&run);
    let response = run.context.into_response();
    assert!(response
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Schema unavailable"));
    assert!(response.intermediate_steps.relevant_schema.is_none());
    assert!(response.intermediate_steps.generated_sql_query.is_none());
    assert!(response.intermediate_steps.result_rows.is_none());
    assert_eq!(llm.call_count(), 0);
}

#[test]
fn test_empty_database_is_schema_unavailable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    drop(conn);

    let llm = Arc::new(FakeLlmClient::with_completions(["SELECT 1"]));
    let run = run_with(llm.clone(), open_store(&path), "Anything?");

    assert_eq!(run.state, PipelineState::Failed);
    assert_eq!(
        run.context.error_message.as_deref(),
        Some("Schema unavailable: no tables found in the database")
    );
    assert_eq!(llm.call_count(), 0);
}

#[test]
fn test_generation_failure_skips_execution() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));
    let llm = Arc::new(FakeLlmClient::always_error(LlmError::HttpError(
        "HTTP 503".to_string(),
    )));

    let run = run_with(llm.clone(), store, "How many employees?");

    assert_eq!(run.state, PipelineState::Failed);
    assert_exactly_one_outcome(&run);
    assert_eq!(
        run.context.error_message.as_deref(),
        Some("SQL generation failed: HTTP error: HTTP 503")
    );
    assert!(run.context.schema_text.is_some());
    assert!(run.context.sql_text.is_none());
    assert!(run.context.execution().is_none());
    assert_eq!(llm.call_count(), 1);
}

#[test]
fn test_prose_completion_is_no_sql() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));
    let llm = Arc::new(FakeLlmClient::with_completions([
        "I am sorry, I cannot help with that question.",
    ]));

    let run = run_with(llm.clone(), store, "Tell me a joke");

    assert_eq!(run.state, PipelineState::Failed);
    assert_eq!(
        run.context.error_message.as_deref(),
        Some("SQL generation failed to produce a query")
    );
    assert!(run.context.sql_text.is_none());
    assert!(run.context.rows().is_none());
    assert_eq!(llm.call_count(), 1);
}

#[test]
fn test_synthesis_failure_keeps_partial_steps() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));
    let llm = Arc::new(FakeLlmClient::new(vec![
        Ok("SELECT name FROM employees WHERE dept = 'HR'".to_string()),
        Err(LlmError::Timeout(60)),
    ]));

    let run = run_with(llm.clone(), store, "Who works in HR?");

    assert_eq!(run.state, PipelineState::Failed);
    assert_exactly_one_outcome(&run);
    let response = run.context.into_response();
    assert_eq!(
        response.error_message.as_deref(),
        Some("Answer synthesis failed: Request timeout after 60 seconds")
    );
    assert!(response.natural_language_answer.is_none());
    let steps = &response.intermediate_steps;
    assert!(steps.relevant_schema.is_some());
    assert!(steps.generated_sql_query.is_some());
    assert_eq!(steps.result_rows.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_zero_rows_is_no_match() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));
    let llm = Arc::new(FakeLlmClient::with_completions([
        "SELECT name FROM employees WHERE dept = 'Legal'",
        "No employees were found in Legal.",
    ]));

    let run = run_with(llm.clone(), store, "Who works in Legal?");

    assert_eq!(run.state, PipelineState::Done);
    assert!(llm.prompts()[1].contains(NO_MATCHING_RECORDS));
    let response = run.context.into_response();
    assert!(response.is_no_match());
    assert_eq!(response.intermediate_steps.result_rows, Some(vec![]));
    assert_eq!(
        response.intermediate_steps.execution_message.as_deref(),
        Some(NO_MATCHING_RECORDS)
    );
}

#[test]
fn test_read_only_database_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let path = office_db(&dir);
    let llm = Arc::new(FakeLlmClient::with_completions([
        "DELETE FROM employees",
        "The database cannot be modified.",
    ]));

    let run = run_with(llm, open_store(&path), "Delete everyone");

    assert_eq!(run.state, PipelineState::Done);
    let error = run.context.execution_error().unwrap();
    assert!(error.contains("readonly"), "unexpected error: {}", error);

    let conn = Connection::open(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 5);
}

#[test]
fn test_schema_mentions_every_table_and_column() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));
    let llm = Arc::new(FakeLlmClient::with_completions(["SELECT 1 AS one", "One."]));

    let run = run_with(llm, store, "q");
    let schema = run.context.schema_text.unwrap();
    for name in ["employees", "departments", "id", "name", "dept"] {
        assert!(schema.contains(name), "schema missing {}: {}", name, schema);
    }
    assert_eq!(schema.lines().count(), 2);
}

#[test]
fn test_prompt_rows_are_capped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("many.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE t (n INTEGER);
         WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 25)
         INSERT INTO t SELECT n FROM seq;",
    )
    .unwrap();
    drop(conn);

    let llm = Arc::new(FakeLlmClient::with_completions(["SELECT n FROM t", "25 numbers."]));
    let run = Pipeline::new(llm.clone(), open_store(&path))
        .with_max_prompt_rows(20)
        .run("List the numbers");

    assert_eq!(run.context.rows().map(<[Row]>::len), Some(25));
    assert!(llm.prompts()[1].contains("... (and 5 more rows)"));
}

#[test]
fn test_schema_notes_reach_the_sql_prompt() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));
    let llm = Arc::new(FakeLlmClient::with_completions(["SELECT 1", "One."]));

    Pipeline::new(llm.clone(), store)
        .with_schema_notes(Some("-- dept holds the department name".to_string()))
        .run("q");

    assert!(llm.prompts()[0].contains("-- dept holds the department name"));
}

#[test]
fn test_every_scenario_ends_in_one_terminal_state() {
    let dir = TempDir::new().unwrap();
    let path = office_db(&dir);
    let scripts: Vec<Vec<Result<String, LlmError>>> = vec![
        vec![Ok("SELECT * FROM employees".into()), Ok("Five people.".into())],
        vec![Ok("SELECT nope FROM employees".into()), Ok("No such column.".into())],
        vec![Err(LlmError::EmptyResponse)],
        vec![Ok("no sql here".into())],
        vec![Ok("SELECT 1".into()), Ok("   ".into())],
    ];

    for script in scripts {
        let llm = Arc::new(FakeLlmClient::new(script));
        let run = run_with(llm, open_store(&path), "q");
        assert_exactly_one_outcome(&run);
        if run.context.execution_error().is_some() {
            assert!(run.context.rows().is_none());
            assert_eq!(run.state, PipelineState::Done);
        }
    }
}

#[test]
fn test_invalid_utf8_result_keeps_store_usable() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&office_db(&dir));

    let llm = Arc::new(FakeLlmClient::with_completions([
        "SELECT CAST(x'FF' AS TEXT) AS v",
        "The value is not readable text.",
    ]));
    let run = run_with(llm, Arc::clone(&store), "Show the raw value");
    assert_eq!(run.state, PipelineState::Done);
    let rows = run.context.rows().unwrap();
    assert_eq!(rows[0]["v"], json!("\u{FFFD}"));

    let llm = Arc::new(FakeLlmClient::with_completions([
        "SELECT COUNT(*) AS count FROM employees",
        "There are 5 employees.",
    ]));
    let run = run_with(llm, store, "How many employees?");
    assert_eq!(run.state, PipelineState::Done);
    assert!(run.context.error_message.is_none());
}
