//! Conversation → profile fact extraction.

use std::sync::Arc;

use async_trait::async_trait;
use cp_domain::error::{Error, Result};
use cp_domain::profile::UserProfile;
use cp_domain::records::response_schema;
use cp_domain::tool::Message;
use cp_providers::{ChatRequest, LlmProvider};

use crate::transcript::render_transcript;

/// Turns a conversation into the profile facts worth remembering.
#[async_trait]
pub trait MemoryExtractor: Send + Sync {
    /// Return the facts found in `conversation`, or `None` when there is
    /// nothing to remember. `existing` is the profile already on file.
    async fn reconcile(
        &self,
        conversation: &[Message],
        existing: Option<&UserProfile>,
    ) -> Result<Option<UserProfile>>;
}

const INSTRUCTIONS: &str = "\
Extract durable facts about the user from the conversation below: their name, \
what they prefer to be called, how they like answers written, special skills, \
preferred work mode and any other stated preferences (feedback, preferred jobs, \
preferred locations). Only record what the user said about themselves. \
Leave a field empty when the conversation says nothing about it. \
Reply with a JSON object matching the schema.";

/// Extractor backed by a chat model constrained to the profile schema.
pub struct LlmMemoryExtractor {
    llm: Arc<dyn LlmProvider>,
    max_chars: usize,
}

impl LlmMemoryExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, max_chars: usize) -> Self {
        Self { llm, max_chars }
    }

    fn prompt(&self, conversation: &[Message], existing: Option<&UserProfile>) -> Vec<Message> {
        let mut system = INSTRUCTIONS.to_string();
        if let Some(profile) = existing.filter(|p| !p.is_empty()) {
            system.push_str("\n\nAlready known (do not repeat unless it changed):\n");
            system.push_str(&profile.to_prompt_block());
        }
        vec![
            Message::system(system),
            Message::user(render_transcript(conversation, self.max_chars)),
        ]
    }
}

#[async_trait]
impl MemoryExtractor for LlmMemoryExtractor {
    async fn reconcile(
        &self,
        conversation: &[Message],
        existing: Option<&UserProfile>,
    ) -> Result<Option<UserProfile>> {
        let req = ChatRequest {
            messages: self.prompt(conversation, existing),
            response_schema: Some(response_schema::<UserProfile>()),
            temperature: Some(0.0),
            ..Default::default()
        };
        let resp = self.llm.chat(&req).await?;

        let raw = resp.content.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let facts: UserProfile = serde_json::from_str(raw)
            .map_err(|e| Error::Extract(format!("profile facts did not match schema: {e}")))?;
        Ok((!facts.is_empty()).then_some(facts))
    }
}
