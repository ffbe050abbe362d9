use serde::{Deserialize, Serialize};

use super::AuthConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Vector search and web search collaborators
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchConfig {
    #[serde(default)]
    pub pinecone: PineconeConfig,
    #[serde(default)]
    pub tavily: TavilyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    /// Data-plane host of the index, e.g. `https://jobs-index-xxxx.svc.pinecone.io`.
    /// Empty disables knowledge base search.
    #[serde(default)]
    pub index_host: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "d_top_k")]
    pub top_k: u32,
    #[serde(default = "d_pinecone_auth")]
    pub auth: AuthConfig,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            index_host: String::new(),
            namespace: None,
            top_k: d_top_k(),
            auth: d_pinecone_auth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyConfig {
    #[serde(default = "d_tavily_url")]
    pub base_url: String,
    #[serde(default = "d_max_results")]
    pub max_results: u32,
    #[serde(default = "d_tavily_auth")]
    pub auth: AuthConfig,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            base_url: d_tavily_url(),
            max_results: d_max_results(),
            auth: d_tavily_auth(),
        }
    }
}

fn d_top_k() -> u32 {
    5
}
fn d_pinecone_auth() -> AuthConfig {
    AuthConfig::from_env("PINECONE_API_KEY")
}
fn d_tavily_url() -> String {
    "https://api.tavily.com".into()
}
fn d_max_results() -> u32 {
    5
}
fn d_tavily_auth() -> AuthConfig {
    AuthConfig::from_env("TAVILY_API_KEY")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_defaults_read_keys_from_env() {
        let cfg: SearchConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.pinecone.auth.env.as_deref(), Some("PINECONE_API_KEY"));
        assert_eq!(cfg.tavily.auth.env.as_deref(), Some("TAVILY_API_KEY"));
        assert!(cfg.pinecone.index_host.is_empty());
        assert_eq!(cfg.tavily.max_results, 5);
    }
}
