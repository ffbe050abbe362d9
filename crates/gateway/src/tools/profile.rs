//! Remembering what the user has told us about themselves.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use cp_domain::tool::ToolDefinition;
use cp_memory::ProfileUpdater;
use serde_json::{json, Value};

use super::{args, ToolContext, ToolHandler, ToolKind};

pub struct ProfileTool {
    updater: Arc<ProfileUpdater>,
}

impl ProfileTool {
    pub fn new(updater: Arc<ProfileUpdater>) -> Self {
        Self { updater }
    }
}

#[async_trait]
impl ToolHandler for ProfileTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ProfileUpdate
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.kind().name().into(),
            description: "Save what the user shared about themselves (name, skills, preferred \
                          work mode, how they like answers) so later conversations can use it."
                .into(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(&self, ctx: &ToolContext, raw: &Value) -> anyhow::Result<String> {
        // Takes no arguments, but a truncated call is still malformed.
        args::object(raw)?;
        let update = self
            .updater
            .update(&ctx.user_id, &ctx.conversation)
            .await
            .with_context(|| format!("profile update for {}", ctx.user_id))?;
        Ok(update.summary())
    }
}
