//! Error types for SQLSage clients.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlSageError {
    #[error("Daemon not reachable at {0}. Is sqlsaged running?")]
    DaemonNotRunning(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SqlSageError {
    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            SqlSageError::DaemonNotRunning(_) => 3,
            SqlSageError::Http(_) => 4,
            SqlSageError::Rejected(_) => 2,
            SqlSageError::Database(_) => 5,
            SqlSageError::Io(_) => 6,
            SqlSageError::Json(_) => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            SqlSageError::DaemonNotRunning("x".into()),
            SqlSageError::Http("x".into()),
            SqlSageError::Rejected("x".into()),
            SqlSageError::Database("x".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_daemon_not_running_message_names_url() {
        let err = SqlSageError::DaemonNotRunning("http://127.0.0.1:5001".into());
        assert!(err.to_string().contains("127.0.0.1:5001"));
    }
}
