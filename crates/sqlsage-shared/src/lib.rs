//! Shared types and utilities for SQLSage components.
//!
//! The daemon and the CLI both speak the `/ask` JSON contract defined in
//! [`rpc`], and both render answers with the rules in [`presentation`].

pub mod error;
pub mod presentation;
pub mod rpc;
pub mod sql;

pub use error::SqlSageError;
pub use rpc::{AskRequest, AskResponse, ErrorBody, HealthResponse, IntermediateSteps, Row};
pub use sql::extract_sql;

/// Crate version, shared by daemon and CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Message reported when a query ran cleanly but matched nothing
pub const NO_MATCHING_RECORDS: &str = "No matching records found.";
