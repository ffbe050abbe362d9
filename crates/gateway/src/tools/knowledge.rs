//! Semantic search over the indexed job postings.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use cp_domain::tool::ToolDefinition;
use serde_json::{json, Value};

use super::{args, format, ToolContext, ToolHandler, ToolKind};
use crate::search::VectorSearch;

pub struct KnowledgeSearch {
    search: Arc<dyn VectorSearch>,
}

impl KnowledgeSearch {
    pub fn new(search: Arc<dyn VectorSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl ToolHandler for KnowledgeSearch {
    fn kind(&self) -> ToolKind {
        ToolKind::KnowledgeBase
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.kind().name().into(),
            description: "Search the platform's knowledge base of job postings, sessions and \
                          mentorship programs by meaning."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "What to look for." }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, _ctx: &ToolContext, raw: &Value) -> anyhow::Result<String> {
        let map = args::object(raw)?;
        let query = args::required(&map, "query")?;
        let hits = self
            .search
            .search(&query)
            .await
            .context("knowledge base search")?;
        Ok(format::hits(&hits))
    }
}
