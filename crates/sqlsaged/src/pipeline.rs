//! Pipeline orchestrator.
//!
//! Sequences the four stages over one `QueryContext`:
//! `Start -> SchemaFetched -> SqlGenerated -> Executed -> Synthesized -> Done`,
//! with `Failed` as the other terminal state. A stage either advances the
//! state or returns a fatal `PipelineError`; the orchestrator is the only
//! place that decides to stop.

use crate::answer_synth::synthesize_answer;
use crate::context::{ExecutionOutcome, QueryContext};
use crate::error::PipelineError;
use crate::executor::execute;
use crate::llm_client::LlmClient;
use crate::query_synth::synthesize_sql;
use crate::schema_inspector::inspect;
use crate::store::SqlStore;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn};
use uuid::Uuid;

pub const DEFAULT_MAX_PROMPT_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    SchemaFetched,
    SqlGenerated,
    Executed,
    Synthesized,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    fn stage_name(self) -> &'static str {
        match self {
            PipelineState::Start => "schema_inspector",
            PipelineState::SchemaFetched => "query_synthesizer",
            PipelineState::SqlGenerated => "query_executor",
            PipelineState::Executed => "answer_synthesizer",
            PipelineState::Synthesized => "finish",
            PipelineState::Done | PipelineState::Failed => "none",
        }
    }
}

/// Result of one question: the filled context and where it stopped
#[derive(Debug)]
pub struct PipelineRun {
    pub context: QueryContext,
    pub state: PipelineState,
}

pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn SqlStore>,
    schema_notes: Option<String>,
    max_prompt_rows: usize,
    today: Option<NaiveDate>,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<dyn SqlStore>) -> Self {
        Self {
            llm,
            store,
            schema_notes: None,
            max_prompt_rows: DEFAULT_MAX_PROMPT_ROWS,
            today: None,
        }
    }

    pub fn with_schema_notes(mut self, notes: Option<String>) -> Self {
        self.schema_notes = notes;
        self
    }

    pub fn with_max_prompt_rows(mut self, max_prompt_rows: usize) -> Self {
        self.max_prompt_rows = max_prompt_rows;
        self
    }

    /// Pin the date used for relative time references (tests)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    pub fn database(&self) -> String {
        self.store.describe()
    }

    /// Answer one question. Always returns a context ending in `Done` or `Failed`.
    pub fn run(&self, question: &str) -> PipelineRun {
        let span = info_span!("ask", request_id = %Uuid::new_v4());
        let _enter = span.enter();
        info!("Question: {:?}", question);

        let total = Instant::now();
        let mut ctx = QueryContext::new(question);
        let mut state = PipelineState::Start;

        while !state.is_terminal() {
            let stage = state.stage_name();
            let started = Instant::now();
            state = match self.step(state, &mut ctx) {
                Ok(next) => {
                    info!(
                        "Stage {} -> {:?} in {}ms",
                        stage,
                        next,
                        started.elapsed().as_millis()
                    );
                    next
                }
                Err(e) => {
                    warn!("Stage {} failed ({}): {}", stage, e.kind(), e);
                    ctx.error_message = Some(e.to_string());
                    PipelineState::Failed
                }
            };
        }

        info!("Finished {:?} in {}ms", state, total.elapsed().as_millis());
        PipelineRun {
            context: ctx,
            state,
        }
    }

    fn step(&self, state: PipelineState, ctx: &mut QueryContext) -> Result<PipelineState, PipelineError> {
        match state {
            PipelineState::Start => {
                let schema = inspect(self.store.as_ref(), self.schema_notes.as_deref())?;
                ctx.schema_text = Some(schema);
                Ok(PipelineState::SchemaFetched)
            }
            PipelineState::SchemaFetched => {
                let schema = ctx.schema_text.as_deref().ok_or_else(|| {
                    PipelineError::SchemaUnavailable("schema was not recorded".to_string())
                })?;
                let sql = synthesize_sql(self.llm.as_ref(), ctx.question(), schema, self.today())?;
                info!("Generated SQL: {}", sql);
                ctx.sql_text = Some(sql);
                Ok(PipelineState::SqlGenerated)
            }
            PipelineState::SqlGenerated => {
                let outcome = match ctx.sql_text.as_deref() {
                    Some(sql) => execute(self.store.as_ref(), sql),
                    None => return Err(PipelineError::NoSqlProduced),
                };
                ctx.record_execution(outcome);
                Ok(PipelineState::Executed)
            }
            PipelineState::Executed => {
                let outcome = ctx
                    .execution()
                    .unwrap_or(ExecutionOutcome::Failed("statement was not executed".to_string()));
                let sql = ctx.sql_text.as_deref().unwrap_or_default();
                let answer = synthesize_answer(
                    self.llm.as_ref(),
                    ctx.question(),
                    sql,
                    &outcome,
                    self.max_prompt_rows,
                )?;
                ctx.answer_text = Some(answer);
                Ok(PipelineState::Synthesized)
            }
            PipelineState::Synthesized => Ok(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed => Ok(state),
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{FakeLlmClient, LlmError};
    use crate::store::SqliteStore;
    use rusqlite::Connection;

    fn store() -> Arc<dyn SqlStore> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, dept TEXT);
             INSERT INTO employees (name, dept) VALUES ('Ann', 'Sales'), ('Bo', 'HR');",
        )
        .unwrap();
        Arc::new(SqliteStore::from_connection(conn, ":memory:"))
    }

    #[test]
    fn test_happy_path_reaches_done() {
        let llm = Arc::new(FakeLlmClient::with_completions([
            "SELECT COUNT(*) AS count FROM employees",
            "There are 2 employees.",
        ]));
        let run = Pipeline::new(llm.clone(), store()).run("How many employees?");
        assert_eq!(run.state, PipelineState::Done);
        assert_eq!(run.context.answer_text.as_deref(), Some("There are 2 employees."));
        assert!(run.context.error_message.is_none());
        assert_eq!(llm.call_count(), 2);
    }

    #[test]
    fn test_generation_failure_stops_before_execution() {
        let llm = Arc::new(FakeLlmClient::always_error(LlmError::Timeout(60)));
        let run = Pipeline::new(llm.clone(), store()).run("q");
        assert_eq!(run.state, PipelineState::Failed);
        assert!(run.context.schema_text.is_some());
        assert!(run.context.sql_text.is_none());
        assert!(run.context.execution().is_none());
        assert_eq!(llm.call_count(), 1);
    }

    #[test]
    fn test_terminal_states() {
        assert!(PipelineState::Done.is_terminal());
        assert!(PipelineState::Failed.is_terminal());
        assert!(!PipelineState::Executed.is_terminal());
    }
}
