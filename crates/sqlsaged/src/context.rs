//! Per-request query context.
//!
//! One `QueryContext` is created for each question and threaded through the
//! pipeline; every stage appends its output. It is never shared between
//! requests and is dropped once the response is built.

use sqlsage_shared::{AskResponse, IntermediateSteps, Row, NO_MATCHING_RECORDS};

/// What running the generated SQL produced
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Statement ran; possibly zero rows
    Rows(Vec<Row>),
    /// Engine rejected the statement
    Failed(String),
}

impl ExecutionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    question: String,
    pub schema_text: Option<String>,
    pub sql_text: Option<String>,
    rows: Option<Vec<Row>>,
    execution_error: Option<String>,
    pub answer_text: Option<String>,
    pub error_message: Option<String>,
}

impl QueryContext {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            schema_text: None,
            sql_text: None,
            rows: None,
            execution_error: None,
            answer_text: None,
            error_message: None,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn rows(&self) -> Option<&[Row]> {
        self.rows.as_deref()
    }

    pub fn execution_error(&self) -> Option<&str> {
        self.execution_error.as_deref()
    }

    /// Record the executor's outcome; rows and error never coexist
    pub fn record_execution(&mut self, outcome: ExecutionOutcome) {
        match outcome {
            ExecutionOutcome::Rows(rows) => {
                self.rows = Some(rows);
                self.execution_error = None;
            }
            ExecutionOutcome::Failed(error) => {
                self.rows = None;
                self.execution_error = Some(error);
            }
        }
    }

    /// The recorded outcome, if execution has happened
    pub fn execution(&self) -> Option<ExecutionOutcome> {
        match (&self.rows, &self.execution_error) {
            (_, Some(error)) => Some(ExecutionOutcome::Failed(error.clone())),
            (Some(rows), None) => Some(ExecutionOutcome::Rows(rows.clone())),
            (None, None) => None,
        }
    }

    /// Build the wire response
    pub fn into_response(self) -> AskResponse {
        let execution_message = match &self.rows {
            Some(rows) if rows.is_empty() => Some(NO_MATCHING_RECORDS.to_string()),
            _ => None,
        };

        AskResponse {
            natural_language_answer: self.answer_text,
            intermediate_steps: IntermediateSteps {
                relevant_schema: self.schema_text,
                generated_sql_query: self.sql_text,
                result_rows: self.rows,
                execution_error: self.execution_error,
                execution_message,
            },
            error_message: self.error_message,
        }
    }
}
