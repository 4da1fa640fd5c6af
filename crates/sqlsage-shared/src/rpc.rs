//! Wire types for the `/ask` and `/health` endpoints.

use serde::{Deserialize, Serialize};

/// One result row: column name to value, in select-list order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Body of `POST /ask`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
        }
    }

    /// The question, if present and not blank
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref().filter(|q| !q.trim().is_empty())
    }
}

/// Diagnostics accumulated by the pipeline, returned even on failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediateSteps {
    pub relevant_schema: Option<String>,
    pub generated_sql_query: Option<String>,
    pub result_rows: Option<Vec<Row>>,
    pub execution_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_message: Option<String>,
}

/// Body of every `/ask` response; pipeline failures are reported in-band
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub natural_language_answer: Option<String>,
    pub intermediate_steps: IntermediateSteps,
    pub error_message: Option<String>,
}

impl AskResponse {
    /// True when the query ran cleanly and matched nothing
    pub fn is_no_match(&self) -> bool {
        self.error_message.is_none()
            && self.intermediate_steps.execution_error.is_none()
            && matches!(&self.intermediate_steps.result_rows, Some(rows) if rows.is_empty())
    }
}

/// Body of a rejected request (HTTP 4xx)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_question_is_rejected() {
        assert!(AskRequest::new("   ").question().is_none());
        assert!(AskRequest::default().question().is_none());
        assert_eq!(AskRequest::new("How many?").question(), Some("How many?"));
    }

    #[test]
    fn test_missing_question_deserializes_to_none() {
        let req: AskRequest = serde_json::from_str("{}").unwrap();
        assert!(req.question.is_none());
    }

    #[test]
    fn test_nulls_are_serialized_and_message_is_skipped() {
        let response = AskResponse::default();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "natural_language_answer": null,
                "intermediate_steps": {
                    "relevant_schema": null,
                    "generated_sql_query": null,
                    "result_rows": null,
                    "execution_error": null
                },
                "error_message": null
            })
        );
    }

    #[test]
    fn test_is_no_match() {
        let mut response = AskResponse::default();
        assert!(!response.is_no_match());

        response.intermediate_steps.result_rows = Some(vec![]);
        assert!(response.is_no_match());

        response.intermediate_steps.execution_error = Some("boom".into());
        assert!(!response.is_no_match());
    }
}
