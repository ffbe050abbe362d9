//! Career advice from the open web.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use cp_domain::tool::ToolDefinition;
use serde_json::{json, Value};

use super::{args, ToolContext, ToolHandler, ToolKind};
use crate::search::WebSearch;

pub struct CareerGuidance {
    web: Arc<dyn WebSearch>,
}

impl CareerGuidance {
    pub fn new(web: Arc<dyn WebSearch>) -> Self {
        Self { web }
    }
}

#[async_trait]
impl ToolHandler for CareerGuidance {
    fn kind(&self) -> ToolKind {
        ToolKind::CareerGuidance
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.kind().name().into(),
            description: "Search the web for career advice: learning paths, skills to build, \
                          how to move into a role."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The career question to research." }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, _ctx: &ToolContext, raw: &Value) -> anyhow::Result<String> {
        let map = args::object(raw)?;
        let query = args::required(&map, "query")?;
        self.web.search(&query).await.context("web search")
    }
}
