//! The conversation state machine.
//!
//! A turn moves through `Deciding` (the model picks a tool or answers),
//! `Dispatching` (the tool runs), `Synthesizing` (the model writes the answer
//! from the tool result) and ends in `Done`. The state is never stored; it
//! is recomputed from the turn's messages by [`next_state`].

use std::sync::Arc;

use cp_domain::records::{response_schema, CareerResponse, EventResponseList, JobResponseList};
use cp_domain::tool::{Message, Role};
use cp_memory::ProfileStore;
use cp_providers::{ChatRequest, ChatResponse, LlmProvider};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::prompts;
use crate::tools::{ToolContext, ToolKind, ToolRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Deciding,
    Dispatching,
    Synthesizing,
    Done,
}

/// The state a turn is in, given the messages appended so far.
pub fn next_state(messages: &[Message]) -> TurnState {
    let Some(last) = messages.last() else {
        return TurnState::Deciding;
    };
    if last.error_message().is_some() {
        return TurnState::Done;
    }
    match last.role {
        Role::User => TurnState::Deciding,
        Role::Tool => TurnState::Synthesizing,
        Role::Assistant => match last.tool_calls().first() {
            Some(call)
                if ToolKind::route(&call.tool_name).is_some()
                    && !call.has_incomplete_arguments() =>
            {
                TurnState::Dispatching
            }
            _ => TurnState::Done,
        },
        Role::System => TurnState::Done,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One user query and everything appended while answering it.
#[derive(Debug, Clone)]
pub struct Turn {
    pub thread_id: String,
    /// Earlier turns of the thread, sent to the model but never re-emitted.
    pub history: Vec<Message>,
    /// This turn's messages, starting with the user query.
    pub messages: Vec<Message>,
}

impl Turn {
    pub fn new(thread_id: impl Into<String>, history: Vec<Message>, query: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            history,
            messages: vec![Message::user(query)],
        }
    }

    pub fn state(&self) -> TurnState {
        next_state(&self.messages)
    }

    /// History followed by this turn.
    pub fn conversation(&self) -> Vec<Message> {
        self.history.iter().chain(&self.messages).cloned().collect()
    }

    /// The error that ended the turn, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.messages.last().and_then(Message::error_message)
    }

    /// The final answer: the text of the last assistant message once done.
    pub fn answer(&self) -> Option<&str> {
        if self.state() != TurnState::Done || self.error().is_some() {
            return None;
        }
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.text().unwrap_or(""))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Structured answers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Shape the synthesizing step must answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    Jobs,
    Events,
    Career,
}

impl AnswerShape {
    pub fn for_tool(kind: ToolKind) -> Option<Self> {
        match kind {
            ToolKind::JobLookup => Some(AnswerShape::Jobs),
            ToolKind::EventLookup => Some(AnswerShape::Events),
            ToolKind::CareerGuidance => Some(AnswerShape::Career),
            ToolKind::KnowledgeBase | ToolKind::ProfileUpdate => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            AnswerShape::Jobs => "JobResponseList",
            AnswerShape::Events => "EventResponseList",
            AnswerShape::Career => "CareerResponse",
        }
    }

    pub fn schema(self) -> Value {
        match self {
            AnswerShape::Jobs => response_schema::<JobResponseList>(),
            AnswerShape::Events => response_schema::<EventResponseList>(),
            AnswerShape::Career => response_schema::<CareerResponse>(),
        }
    }

    /// Parse `raw` as this shape and re-serialize it.
    pub fn conform(self, raw: &str) -> Result<String, serde_json::Error> {
        let raw = strip_code_fence(raw);
        match self {
            AnswerShape::Jobs => reserialize::<JobResponseList>(raw),
            AnswerShape::Events => reserialize::<EventResponseList>(raw),
            AnswerShape::Career => reserialize::<CareerResponse>(raw),
        }
    }
}

fn reserialize<T: DeserializeOwned + Serialize>(raw: &str) -> Result<String, serde_json::Error> {
    let value: T = serde_json::from_str(raw)?;
    serde_json::to_string(&value)
}

/// Models sometimes wrap JSON output in a markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let t = raw.trim();
    let Some(inner) = t.strip_prefix("```") else {
        return t;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Machine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct MachineOptions {
    /// Offer the stored profile to the model as context.
    pub inject_profile: bool,
    pub temperature: Option<f32>,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            inject_profile: true,
            temperature: None,
        }
    }
}

pub struct ConversationMachine {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    profiles: Arc<ProfileStore>,
    opts: MachineOptions,
}

impl ConversationMachine {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        profiles: Arc<ProfileStore>,
        opts: MachineOptions,
    ) -> Self {
        Self {
            llm,
            tools,
            profiles,
            opts,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Advance the turn by one state. Returns true once the turn is done.
    pub async fn step(&self, turn: &mut Turn, user_id: &str) -> bool {
        let state = turn.state();
        tracing::debug!(?state, thread_id = %turn.thread_id, "step");
        match state {
            TurnState::Deciding => self.decide(turn, user_id).await,
            TurnState::Dispatching => self.dispatch(turn, user_id).await,
            TurnState::Synthesizing => self.synthesize(turn, user_id).await,
            TurnState::Done => {}
        }
        turn.state() == TurnState::Done
    }

    fn profile(&self, user_id: &str) -> Option<cp_domain::profile::UserProfile> {
        if self.opts.inject_profile {
            self.profiles.get(user_id)
        } else {
            None
        }
    }

    async fn call_model(&self, req: &ChatRequest) -> Result<ChatResponse, String> {
        self.llm.chat(req).await.map_err(|e| {
            tracing::warn!(error = %e, "model call failed");
            format!("model call failed: {e}")
        })
    }

    async fn decide(&self, turn: &mut Turn, user_id: &str) {
        let tools = self.tools.definitions();
        let profile = self.profile(user_id);

        let mut messages = vec![Message::system(prompts::deciding(&tools, profile.as_ref()))];
        messages.extend(turn.conversation());
        let req = ChatRequest {
            messages,
            tools,
            temperature: self.opts.temperature,
            ..Default::default()
        };

        let resp = match self.call_model(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                turn.messages.push(Message::error(e));
                return;
            }
        };

        let Some(call) = resp.tool_calls.first() else {
            if resp.content.trim().is_empty() {
                turn.messages.push(Message::error("model returned an empty response"));
            } else {
                turn.messages.push(Message::assistant(resp.content));
            }
            return;
        };
        if resp.tool_calls.len() > 1 {
            tracing::debug!(
                count = resp.tool_calls.len(),
                used = %call.tool_name,
                "model requested several tools; only the first runs"
            );
        }

        turn.messages
            .push(Message::assistant_with_calls(resp.content.clone(), std::slice::from_ref(call)));

        if call.has_incomplete_arguments() {
            // The call keeps its result partner so the recorded history
            // stays well formed; the turn still ends here.
            turn.messages.push(Message::tool_result(
                call.call_id.clone(),
                call.tool_name.clone(),
                "Error: arguments were incomplete and could not be parsed",
                true,
            ));
            turn.messages.push(Message::error(format!(
                "model returned incomplete arguments for {}",
                call.tool_name
            )));
        } else if ToolKind::route(&call.tool_name).is_none() {
            tracing::info!(tool = %call.tool_name, "model called an unknown tool; ending turn");
            if resp.content.trim().is_empty() {
                turn.messages
                    .push(Message::error(format!("model called unknown tool {}", call.tool_name)));
            }
        }
    }

    async fn dispatch(&self, turn: &mut Turn, user_id: &str) {
        let Some(call) = turn
            .messages
            .last()
            .and_then(|m| m.tool_calls().into_iter().next())
        else {
            return;
        };
        let ctx = ToolContext {
            user_id: user_id.to_string(),
            thread_id: turn.thread_id.clone(),
            call_id: call.call_id.clone(),
            conversation: turn.conversation(),
        };
        let (text, is_error) = self.tools.dispatch(&call.tool_name, &call.arguments, &ctx).await;
        turn.messages
            .push(Message::tool_result(call.call_id, call.tool_name, text, is_error));
    }

    async fn synthesize(&self, turn: &mut Turn, user_id: &str) {
        let (kind, tool_failed) = match turn.messages.last().and_then(Message::tool_result_part) {
            Some((_, name, _, is_error)) => (ToolKind::route(name), is_error),
            None => (None, false),
        };
        // A failed tool gets a free-text apology rather than an empty list.
        let shape = kind.and_then(AnswerShape::for_tool).filter(|_| !tool_failed);
        let profile = self.profile(user_id);

        let mut messages = vec![Message::system(prompts::synthesizing(kind, profile.as_ref()))];
        messages.extend(turn.conversation());
        let req = ChatRequest {
            messages,
            temperature: self.opts.temperature,
            response_schema: shape.map(AnswerShape::schema),
            ..Default::default()
        };

        let resp = match self.call_model(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                turn.messages.push(Message::error(e));
                return;
            }
        };

        let Some(shape) = shape else {
            turn.messages.push(Message::assistant(resp.content));
            return;
        };
        match shape.conform(&resp.content) {
            Ok(json) => turn.messages.push(Message::assistant(json)),
            Err(e) => {
                tracing::warn!(shape = shape.type_name(), error = %e, "structured answer rejected");
                turn.messages.push(Message::error(format!(
                    "model answer did not match {}: {e}",
                    shape.type_name()
                )));
            }
        }
    }
}
