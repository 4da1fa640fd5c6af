//! SQLSage Daemon - answers questions about a SQLite database over HTTP.

use anyhow::{Context, Result};
use sqlsaged::config::Config;
use sqlsaged::llm_client::HttpLlmClient;
use sqlsaged::server::{self, AppState};
use sqlsaged::store::SqliteStore;
use sqlsaged::Pipeline;
use std::sync::Arc;
use tracing::info;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("[BOOT] SQLSage Daemon v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load();

    let store = SqliteStore::open(&config.database.path, config.database.read_only)
        .context("Failed to open database")?;
    info!("[BOOT] Database {} ready", config.database.path.display());

    let notes = config.schema_notes()?;
    let llm = HttpLlmClient::new(config.llm.clone()).context("Failed to create LLM client")?;
    info!("[BOOT] Model {} at {}", config.llm.model, config.llm.endpoint);

    let pipeline = Pipeline::new(Arc::new(llm), Arc::new(store))
        .with_schema_notes(notes)
        .with_max_prompt_rows(config.llm.max_prompt_rows);
    let state = Arc::new(AppState::new(pipeline));

    // The blocking HTTP client must be dropped outside the async runtime,
    // so `state` outlives `runtime`.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    let result = runtime.block_on(server::run(&config.server.bind, Arc::clone(&state)));
    drop(runtime);
    drop(state);

    result
}
