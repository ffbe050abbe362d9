//! The five tools the model can call, and the registry that dispatches to
//! them by name.

pub mod args;
pub mod events;
pub mod format;
pub mod guidance;
pub mod jobs;
pub mod knowledge;
pub mod profile;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cp_domain::tool::{Message, ToolDefinition};
use cp_domain::trace::TraceEvent;
use serde_json::Value;
use tracing::Instrument;

pub use events::EventLookup;
pub use guidance::CareerGuidance;
pub use jobs::JobLookup;
pub use knowledge::KnowledgeSearch;
pub use profile::ProfileTool;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool names
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Every tool the model is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    KnowledgeBase,
    JobLookup,
    CareerGuidance,
    EventLookup,
    ProfileUpdate,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::KnowledgeBase,
        ToolKind::JobLookup,
        ToolKind::CareerGuidance,
        ToolKind::EventLookup,
        ToolKind::ProfileUpdate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::KnowledgeBase => "vectorstore_retriever",
            ToolKind::JobLookup => "publicapi_retriever",
            ToolKind::CareerGuidance => "career_guidance",
            ToolKind::EventLookup => "current_events",
            ToolKind::ProfileUpdate => "update_user_profile",
        }
    }

    /// Resolve a name the model used. Older prompts named every tool with a
    /// `_tool` suffix; both spellings route to the same tool.
    pub fn route(name: &str) -> Option<Self> {
        let name = name.trim();
        let base = name.strip_suffix("_tool").unwrap_or(name);
        Self::ALL.into_iter().find(|k| k.name() == base)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What a handler knows about the call it is serving.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub user_id: String,
    pub thread_id: String,
    pub call_id: String,
    /// The thread so far, ending with the assistant message that made the call.
    pub conversation: Vec<Message>,
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn kind(&self) -> ToolKind;
    /// The definition shown to the model.
    fn definition(&self) -> ToolDefinition;
    async fn call(&self, ctx: &ToolContext, args: &Value) -> anyhow::Result<String>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<ToolKind, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A second handler for the same tool replaces the first.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let kind = handler.kind();
        if self.handlers.insert(kind, handler).is_some() {
            tracing::warn!(tool = kind.name(), "tool handler replaced");
        }
    }

    pub fn with(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Definitions of every registered tool, in a stable order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL
            .iter()
            .filter_map(|k| self.handlers.get(k))
            .map(|h| h.definition())
            .collect()
    }

    /// Run the named tool. Failures of any kind come back as the result text
    /// with `is_error` set; nothing propagates.
    pub async fn dispatch(&self, tool_name: &str, args: &Value, ctx: &ToolContext) -> (String, bool) {
        let start = Instant::now();
        let span = tracing::info_span!("tool", tool = %tool_name, call_id = %ctx.call_id);

        let outcome = async {
            if tool_name.trim().is_empty() {
                return Err(anyhow::anyhow!("tool name was empty"));
            }
            let kind = ToolKind::route(tool_name)
                .ok_or_else(|| anyhow::anyhow!("unknown tool: {tool_name}"))?;
            let handler = self
                .handlers
                .get(&kind)
                .ok_or_else(|| anyhow::anyhow!("tool {} is not available", kind.name()))?;
            handler.call(ctx, args).await
        }
        .instrument(span)
        .await;

        let (text, is_error) = match outcome {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::warn!(tool = %tool_name, error = %format!("{e:#}"), "tool call failed");
                (format!("Error: {e:#}"), true)
            }
        };

        TraceEvent::ToolDispatched {
            tool_name: tool_name.to_string(),
            call_id: ctx.call_id.clone(),
            is_error,
            result_chars: text.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();
        (text, is_error)
    }
}
