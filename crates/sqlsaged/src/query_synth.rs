//! Query synthesizer: question + schema to one SQL statement.

use crate::error::PipelineError;
use crate::llm_client::LlmClient;
use crate::prompts::build_sql_prompt;
use chrono::NaiveDate;
use sqlsage_shared::extract_sql;
use tracing::{debug, info, warn};

/// Ask the model for SQL and extract a single statement from its completion
pub fn synthesize_sql(
    llm: &dyn LlmClient,
    question: &str,
    schema: &str,
    today: NaiveDate,
) -> Result<String, PipelineError> {
    let prompt = build_sql_prompt(schema, question, today);
    info!("Query synthesizer: prompt {} bytes", prompt.len());

    let completion = llm
        .generate(&prompt)
        .map_err(|e| PipelineError::GenerationFailed(e.to_string()))?;
    debug!("Query synthesizer: completion {:?}", completion);

    match extract_sql(&completion) {
        Some(sql) => Ok(sql),
        None => {
            warn!("Query synthesizer: no SQL in {} byte completion", completion.len());
            Err(PipelineError::NoSqlProduced)
        }
    }
}
