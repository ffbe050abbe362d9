use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_provider_id")]
    pub provider_id: String,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_embedding_model")]
    pub embedding_model: String,
    /// Output dimensionality requested from the embedding model.
    #[serde(default = "d_embedding_dims")]
    pub embedding_dimensions: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_id: d_provider_id(),
            base_url: d_base_url(),
            model: d_model(),
            embedding_model: d_embedding_model(),
            embedding_dimensions: d_embedding_dims(),
            temperature: None,
            timeout_ms: d_timeout_ms(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default = "d_google_env")]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env).
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            env: d_google_env(),
            key: None,
        }
    }
}

impl AuthConfig {
    pub fn from_env(var: &str) -> Self {
        Self {
            env: Some(var.into()),
            key: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "google".into()
}
fn d_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_model() -> String {
    "gemini-2.0-flash".into()
}
fn d_embedding_model() -> String {
    "text-embedding-004".into()
}
fn d_embedding_dims() -> u32 {
    768
}
fn d_timeout_ms() -> u64 {
    120_000
}
fn d_google_env() -> Option<String> {
    Some("GOOGLE_API_KEY".into())
}
