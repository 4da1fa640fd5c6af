//! SQLSage daemon library - exposes modules for testing.

pub mod answer_synth;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod llm_client;
pub mod pipeline;
pub mod prompts;
pub mod query_synth;
pub mod routes;
pub mod schema_inspector;
pub mod server;
pub mod store;

pub use context::{ExecutionOutcome, QueryContext};
pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineRun, PipelineState};
