mod cache;
mod extract;
mod guardrail;
mod llm;
mod memory;
mod observability;
mod search;
mod server;

pub use cache::*;
pub use extract::*;
pub use guardrail::*;
pub use llm::*;
pub use memory::*;
pub use observability::*;
pub use search::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub guardrail: GuardrailConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Persisted state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Root directory for cache files, profiles and thread history.
    #[serde(default = "d_state_path")]
    pub path: PathBuf,
    /// Prior messages of a thread replayed into each new turn.
    #[serde(default = "d_history_limit")]
    pub history_limit: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: d_state_path(),
            history_limit: d_history_limit(),
        }
    }
}

impl StateConfig {
    pub fn cache_dir(&self) -> PathBuf {
        self.path.join("cache")
    }
    pub fn profiles_path(&self) -> PathBuf {
        self.path.join("profiles").join("profiles.json")
    }
    pub fn threads_path(&self) -> PathBuf {
        self.path.join("threads").join("threads.json")
    }
}

fn d_state_path() -> PathBuf {
    PathBuf::from("./data/state")
}
fn d_history_limit() -> usize {
    40
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |severity, field: &str, message: &str| {
            errors.push(ConfigError {
                severity,
                field: field.into(),
                message: message.into(),
            })
        };

        if self.server.port == 0 {
            push(ConfigSeverity::Error, "server.port", "port must be greater than 0");
        }
        if self.server.host.is_empty() {
            push(ConfigSeverity::Error, "server.host", "host must not be empty");
        }
        if self.llm.base_url.is_empty() {
            push(ConfigSeverity::Error, "llm.base_url", "base_url must not be empty");
        }
        if self.cache.ttl_hours == 0 {
            push(ConfigSeverity::Error, "cache.ttl_hours", "ttl must be at least one hour");
        }
        if self.extract.wait_timeout_secs == 0 {
            push(
                ConfigSeverity::Warning,
                "extract.wait_timeout_secs",
                "a zero wait never sees client-rendered cards",
            );
        }
        if url_like(&self.extract.jobs_url).is_none() {
            push(ConfigSeverity::Error, "extract.jobs_url", "must be an http(s) URL");
        }
        if url_like(&self.extract.events_url).is_none() {
            push(ConfigSeverity::Error, "extract.events_url", "must be an http(s) URL");
        }
        if self.memory.default_user_id.trim().is_empty() {
            push(ConfigSeverity::Error, "memory.default_user_id", "must not be empty");
        }
        if self.guardrail.bias_threshold > 100 {
            push(ConfigSeverity::Error, "guardrail.bias_threshold", "must be between 0 and 100");
        }
        if self.search.pinecone.index_host.is_empty() {
            push(
                ConfigSeverity::Warning,
                "search.pinecone.index_host",
                "knowledge base search is disabled",
            );
        }
        if self.server.cors.allowed_origins.len() == 1 && self.server.cors.allowed_origins[0] == "*" {
            push(
                ConfigSeverity::Warning,
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            );
        }

        errors
    }
}

fn url_like(s: &str) -> Option<&str> {
    s.strip_prefix("https://").or_else(|| s.strip_prefix("http://"))
}
