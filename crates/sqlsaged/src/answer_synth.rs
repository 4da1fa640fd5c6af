//! Answer synthesizer: explain the execution outcome in natural language.

use crate::context::ExecutionOutcome;
use crate::error::PipelineError;
use crate::llm_client::LlmClient;
use crate::prompts::build_answer_prompt;
use tracing::info;

pub fn synthesize_answer(
    llm: &dyn LlmClient,
    question: &str,
    sql: &str,
    outcome: &ExecutionOutcome,
    max_prompt_rows: usize,
) -> Result<String, PipelineError> {
    let prompt = build_answer_prompt(question, sql, outcome, max_prompt_rows);
    info!("Answer synthesizer: prompt {} bytes", prompt.len());

    let completion = llm
        .generate(&prompt)
        .map_err(|e| PipelineError::SynthesisFailed(e.to_string()))?;

    let answer = completion.trim();
    if answer.is_empty() {
        return Err(PipelineError::SynthesisFailed(
            "model returned an empty answer".to_string(),
        ));
    }
    Ok(answer.to_string())
}
