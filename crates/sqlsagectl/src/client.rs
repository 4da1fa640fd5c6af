//! HTTP client for communicating with sqlsaged.

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use sqlsage_shared::{AskRequest, AskResponse, ErrorBody, HealthResponse, SqlSageError};
use std::time::Duration;
use tracing::debug;

/// Default daemon address
pub const DEFAULT_URL: &str = "http://127.0.0.1:5001";

/// Covers two model calls plus execution
const ASK_TIMEOUT_SECS: u64 = 180;
const HEALTH_TIMEOUT_SECS: u64 = 5;

/// Client for communicating with sqlsaged
pub struct DaemonClient {
    base_url: String,
    http: Client,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Result<Self, SqlSageError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(ASK_TIMEOUT_SECS))
            .build()
            .map_err(|e| SqlSageError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a question to `POST /ask`
    pub fn ask(&self, question: &str) -> Result<AskResponse, SqlSageError> {
        let url = format!("{}/ask", self.base_url);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(&AskRequest::new(question))
            .send()
            .map_err(|e| self.map_send_error(e))?;
        decode(response)
    }

    /// Query `GET /health`
    pub fn health(&self) -> Result<HealthResponse, SqlSageError> {
        let url = format!("{}/health", self.base_url);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .map_err(|e| self.map_send_error(e))?;
        decode(response)
    }

    fn map_send_error(&self, e: reqwest::Error) -> SqlSageError {
        if e.is_connect() {
            SqlSageError::DaemonNotRunning(self.base_url.clone())
        } else {
            SqlSageError::Http(e.to_string())
        }
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SqlSageError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| SqlSageError::Http(e.to_string()))?;

    if status == StatusCode::BAD_REQUEST {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        return Err(SqlSageError::Rejected(message));
    }
    if !status.is_success() {
        return Err(SqlSageError::Http(format!("HTTP {}: {}", status, body.trim())));
    }

    Ok(serde_json::from_str(&body)?)
}
