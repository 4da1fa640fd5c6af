//! Fatal pipeline conditions.
//!
//! Execution errors are not here: a rejected statement is a normal outcome
//! that the answer stage explains, see `ExecutionOutcome::Failed`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("SQL generation failed: {0}")]
    GenerationFailed(String),

    #[error("SQL generation failed to produce a query")]
    NoSqlProduced,

    #[error("Answer synthesis failed: {0}")]
    SynthesisFailed(String),
}

impl PipelineError {
    /// Stable identifier for logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::SchemaUnavailable(_) => "schema_unavailable",
            PipelineError::GenerationFailed(_) => "generation_failed",
            PipelineError::NoSqlProduced => "no_sql_produced",
            PipelineError::SynthesisFailed(_) => "synthesis_failed",
        }
    }
}
