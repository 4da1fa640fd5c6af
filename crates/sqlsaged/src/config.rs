//! Configuration management for sqlsaged.
//!
//! Loads settings from the first config file found, or uses defaults:
//! `$SQLSAGE_CONFIG`, `/etc/sqlsage/config.toml`,
//! `<user config dir>/sqlsage/config.toml`, `./sqlsage.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "SQLSAGE_CONFIG";

/// Environment variable overriding `[llm] api_key`
pub const API_KEY_ENV: &str = "SQLSAGE_API_KEY";

/// System-wide config file path
pub const SYSTEM_CONFIG_PATH: &str = "/etc/sqlsage/config.toml";

/// Config file in the working directory
pub const LOCAL_CONFIG_PATH: &str = "sqlsage.toml";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:5001".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Open the database read-only so generated SQL cannot modify it
    #[serde(default = "default_read_only")]
    pub read_only: bool,

    /// Free-text notes appended to the schema description (date formats etc.)
    #[serde(default)]
    pub schema_notes_path: Option<PathBuf>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/office_rag.db")
}

fn default_read_only() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            read_only: default_read_only(),
            schema_notes_path: None,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama or OpenAI-compatible base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer token for OpenAI-compatible endpoints
    #[serde(default)]
    pub api_key: Option<String>,

    /// Client-level timeout for one completion
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Rows embedded in the answer prompt before the rest are summarised
    #[serde(default = "default_max_prompt_rows")]
    pub max_prompt_rows: usize,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_prompt_rows() -> usize {
    20
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_prompt_rows: default_max_prompt_rows(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Load config from the first readable candidate, or return defaults
    pub fn load() -> Self {
        let mut config = Self::candidate_paths()
            .into_iter()
            .find_map(|path| match Self::load_from_path(&path) {
                Ok(config) => Some(config),
                Err(e) if path.exists() => {
                    warn!("Ignoring unreadable config {}: {:#}", path.display(), e);
                    None
                }
                Err(_) => None,
            })
            .unwrap_or_else(|| {
                warn!("Config not found, using defaults");
                Config::default()
            });
        config.apply_env();
        config
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlsage").join("config.toml"));
        }
        paths.push(PathBuf::from(LOCAL_CONFIG_PATH));
        paths
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
    }

    /// Read the configured schema notes, if any
    pub fn schema_notes(&self) -> Result<Option<String>> {
        let Some(path) = &self.database.schema_notes_path else {
            return Ok(None);
        };
        let notes = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema notes {}", path.display()))?;
        Ok(Some(notes.trim().to_string()).filter(|n| !n.is_empty()))
    }
}
