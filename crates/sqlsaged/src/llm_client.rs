//! LLM client abstraction.
//!
//! The pipeline sees the model only as `generate(prompt) -> text`.
//! `HttpLlmClient` talks to Ollama (falling back to an OpenAI-compatible API);
//! `FakeLlmClient` replays scripted completions for tests.

use crate::config::LlmConfig;
use anyhow::Result;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// LLM errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

/// Generic LLM client trait
pub trait LlmClient: Send + Sync {
    /// Send one prompt, return the raw completion text
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model name, for logs and health reports
    fn model(&self) -> &str;
}

/// Real LLM client implementation using HTTP
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    /// Check if endpoint is Ollama-style
    fn is_ollama_endpoint(&self) -> bool {
        self.config.endpoint.contains("11434") || self.config.endpoint.contains("ollama")
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.timeout_secs)
        } else {
            LlmError::HttpError(format!("Request failed: {}", e))
        }
    }

    /// Call Ollama-style API
    fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));

        let request_body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.config.temperature },
        });

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from Ollama",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        response_json
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }

    /// Call OpenAI-compatible API
    fn call_openai_compatible(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": prompt},
            ],
            "temperature": self.config.temperature,
        });

        let mut request = self.client.post(&url).json(&request_body);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from OpenAI-compatible API",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        response_json
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }
}

impl LlmClient for HttpLlmClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        // Try Ollama-style API first
        if self.is_ollama_endpoint() {
            match self.call_ollama(prompt) {
                Ok(text) => return Ok(text),
                // A timeout will not get better on the other API
                Err(e @ LlmError::Timeout(_)) => return Err(e),
                Err(e) => {
                    debug!("Ollama API failed, trying OpenAI-compatible: {}", e);
                }
            }
        }

        // Fall back to OpenAI-compatible API
        self.call_openai_compatible(prompt)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Fake LLM client for testing
pub struct FakeLlmClient {
    responses: Mutex<Vec<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlmClient {
    /// Create a fake client with pre-defined responses, replayed in order
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fake client answering each call with the next completion
    pub fn with_completions<I, S>(completions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(completions.into_iter().map(|c| Ok(c.into())).collect())
    }

    /// Create a fake client that always returns an error
    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl LlmClient for FakeLlmClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| LlmError::HttpError("fake client poisoned".to_string()))?;

        match responses.len() {
            0 => Err(LlmError::EmptyResponse),
            // Keep returning the last response
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }

    fn model(&self) -> &str {
        "fake"
    }
}
