//! Search collaborators used by the knowledge-base and career guidance
//! tools.

pub mod pinecone;
pub mod tavily;

use async_trait::async_trait;
use cp_domain::error::{Error, Result};
use serde_json::{Map, Value};

pub use pinecone::PineconeSearch;
pub use tavily::TavilySearch;

/// One vector-search match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub metadata: Map<String, Value>,
    /// Indexed text of the match, when the index stores it.
    pub content: Option<String>,
    pub score: Option<f64>,
}

#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Raw result text for `query`.
    async fn search(&self, query: &str) -> Result<String>;
}

/// Stands in for a collaborator that could not be configured at startup.
/// Every call fails with the recorded reason.
pub struct Unavailable {
    what: &'static str,
    reason: String,
}

impl Unavailable {
    pub fn new(what: &'static str, reason: impl Into<String>) -> Self {
        Self { what, reason: reason.into() }
    }

    fn error(&self) -> Error {
        Error::Config(format!("{} is not configured: {}", self.what, self.reason))
    }
}

#[async_trait]
impl VectorSearch for Unavailable {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
        Err(self.error())
    }
}

#[async_trait]
impl WebSearch for Unavailable {
    async fn search(&self, _query: &str) -> Result<String> {
        Err(self.error())
    }
}
