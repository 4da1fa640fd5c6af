//! Query executor: run the generated statement.
//!
//! Never fails the pipeline. An engine error is captured as
//! `ExecutionOutcome::Failed` for the answer stage to explain.

use crate::context::ExecutionOutcome;
use crate::store::{SqlStore, StoreError};
use std::time::Instant;
use tracing::{info, warn};

pub fn execute(store: &dyn SqlStore, sql: &str) -> ExecutionOutcome {
    let started = Instant::now();
    match store.query(sql) {
        Ok(rows) => {
            info!(
                "Query executor: {} rows in {}ms",
                rows.len(),
                started.elapsed().as_millis()
            );
            ExecutionOutcome::Rows(rows)
        }
        Err(e) => {
            warn!("Query executor: statement rejected: {}", e);
            ExecutionOutcome::Failed(describe_error(&e))
        }
    }
}

fn describe_error(error: &StoreError) -> String {
    match error {
        StoreError::Sqlite(e) => format!("SQLite error: {}", e),
        StoreError::Unavailable(reason) => format!("Execution error: {}", reason),
    }
}
