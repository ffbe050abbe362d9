//! Thread history store.
//!
//! Persists each thread's messages in `threads.json` under the configured
//! state path. Only whole turns are appended.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use cp_domain::error::{Error, Result};
use cp_domain::tool::{ContentPart, Message, MessageContent, Role};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Thread entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub thread_id: String,
    /// The user who opened the thread.
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub turns: u64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Thread store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ThreadStore {
    path: Option<PathBuf>,
    /// Messages kept per thread; older ones are dropped on append.
    keep: usize,
    threads: RwLock<HashMap<String, ThreadEntry>>,
}

impl ThreadStore {
    /// Load or create the store at `path`.
    pub fn new(path: &Path, keep: usize) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(Error::Io)?;
        }

        let threads: HashMap<String, ThreadEntry> = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "thread file unreadable, starting empty");
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        tracing::info!(
            threads = threads.len(),
            path = %path.display(),
            "thread store loaded"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            keep,
            threads: RwLock::new(threads),
        })
    }

    pub fn in_memory(keep: usize) -> Self {
        Self {
            path: None,
            keep,
            threads: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, thread_id: &str) -> Option<ThreadEntry> {
        self.threads.read().get(thread_id).cloned()
    }

    /// Prior messages of a thread, oldest first. Never starts mid-turn.
    pub fn history(&self, thread_id: &str) -> Vec<Message> {
        self.threads
            .read()
            .get(thread_id)
            .map(|t| t.messages.clone())
            .unwrap_or_default()
    }

    /// Append the messages of one finished turn.
    pub fn record_turn(&self, thread_id: &str, user_id: &str, turn: &[Message]) {
        let now = Utc::now();
        let mut threads = self.threads.write();
        let entry = threads
            .entry(thread_id.to_owned())
            .or_insert_with(|| ThreadEntry {
                thread_id: thread_id.to_owned(),
                user_id: user_id.to_owned(),
                created_at: now,
                updated_at: now,
                turns: 0,
                messages: Vec::new(),
            });

        // Error markers are turn-local; replaying them would confuse the
        // next deciding step.
        entry.messages.extend(replayable(turn));
        entry.turns += 1;
        entry.updated_at = now;
        trim_to_turn_boundary(&mut entry.messages, self.keep);
    }

    pub fn list(&self) -> Vec<ThreadEntry> {
        self.threads.read().values().cloned().collect()
    }

    /// Persist the current thread state to disk.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = {
            let threads = self.threads.read();
            serde_json::to_string_pretty(&*threads)
                .map_err(|e| Error::Other(format!("serializing threads: {e}")))?
        };
        write_atomic(path, json.as_bytes())
    }
}

/// Write via a sibling temp file and rename; readers never see a torn file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Other(format!("thread path {} has no parent", path.display())))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(Error::Io)?;
    tmp.write_all(bytes).map_err(Error::Io)?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// The parts of a turn worth replaying. Error markers are turn-local, and a
/// tool call that never got a result (an unknown tool) is reduced to its
/// text so the next request never carries a dangling call.
fn replayable(turn: &[Message]) -> Vec<Message> {
    let answered: HashSet<&str> = turn
        .iter()
        .filter_map(|m| m.tool_result_part().map(|(id, ..)| id))
        .collect();

    turn.iter()
        .filter(|m| m.error_message().is_none())
        .filter_map(|m| match &m.content {
            MessageContent::Parts(parts) if m.role == Role::Assistant => {
                let kept: Vec<ContentPart> = parts
                    .iter()
                    .filter(|p| match p {
                        ContentPart::ToolUse { id, .. } => answered.contains(id.as_str()),
                        _ => true,
                    })
                    .cloned()
                    .collect();
                (!kept.is_empty()).then(|| Message {
                    role: Role::Assistant,
                    content: MessageContent::Parts(kept),
                })
            }
            _ => Some(m.clone()),
        })
        .collect()
}

/// Keep at most `keep` messages, then drop leading messages until the
/// history opens on a user message.
fn trim_to_turn_boundary(messages: &mut Vec<Message>, keep: usize) {
    if messages.len() > keep {
        messages.drain(..messages.len() - keep);
    }
    let first_user = messages
        .iter()
        .position(|m| m.role == Role::User)
        .unwrap_or(messages.len());
    messages.drain(..first_user);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(q: &str, a: &str) -> Vec<Message> {
        vec![Message::user(q), Message::assistant(a)]
    }

    #[test]
    fn unknown_thread_has_no_history() {
        let store = ThreadStore::in_memory(10);
        assert!(store.history("t-1").is_empty());
    }

    #[test]
    fn turns_accumulate_in_order() {
        let store = ThreadStore::in_memory(10);
        store.record_turn("t-1", "u", &turn("hi", "hello"));
        store.record_turn("t-1", "u", &turn("jobs?", "here"));
        let history = store.history("t-1");
        assert_eq!(history.len(), 4);
        assert_eq!(history[2], Message::user("jobs?"));
        assert_eq!(store.get("t-1").unwrap().turns, 2);
    }

    #[test]
    fn error_markers_are_not_replayed() {
        let store = ThreadStore::in_memory(10);
        store.record_turn("t", "u", &[Message::user("q"), Message::error("model down")]);
        assert_eq!(store.history("t"), vec![Message::user("q")]);
    }

    #[test]
    fn unanswered_calls_are_reduced_to_text() {
        use cp_domain::tool::ToolCall;
        let call = ToolCall {
            call_id: "c9".into(),
            tool_name: "send_email".into(),
            arguments: serde_json::json!({}),
        };
        let store = ThreadStore::in_memory(10);
        store.record_turn(
            "t",
            "u",
            &[
                Message::user("mail my cv"),
                Message::assistant_with_calls("Sending it now.", &[call.clone()]),
            ],
        );
        store.record_turn("t2", "u", &[Message::user("x"), Message::assistant_with_calls("", &[call])]);

        let history = store.history("t");
        assert_eq!(history.len(), 2);
        assert!(history[1].tool_calls().is_empty());
        assert_eq!(history[1].content.text(), Some("Sending it now."));
        assert_eq!(store.history("t2"), vec![Message::user("x")]);
    }

    #[test]
    fn answered_calls_are_kept() {
        use cp_domain::tool::ToolCall;
        let call = ToolCall {
            call_id: "c1".into(),
            tool_name: "publicapi_retriever".into(),
            arguments: serde_json::json!({}),
        };
        let store = ThreadStore::in_memory(10);
        store.record_turn(
            "t",
            "u",
            &[
                Message::user("jobs"),
                Message::assistant_with_calls("", &[call]),
                Message::tool_result("c1", "publicapi_retriever", "Job 1:", false),
                Message::assistant("{}"),
            ],
        );
        assert_eq!(store.history("t")[1].tool_calls().len(), 1);
    }

    #[test]
    fn trimming_never_starts_mid_turn() {
        let store = ThreadStore::in_memory(3);
        store.record_turn(
            "t",
            "u",
            &[
                Message::user("first"),
                Message::assistant("a"),
                Message::tool_result("c1", "current_events", "Event 1:", false),
                Message::assistant("b"),
            ],
        );
        store.record_turn("t", "u", &turn("second", "c"));
        let history = store.history("t");
        assert_eq!(history[0], Message::user("second"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn threads_are_isolated() {
        let store = ThreadStore::in_memory(10);
        store.record_turn("a", "u1", &turn("x", "y"));
        assert!(store.history("b").is_empty());
        assert_eq!(store.list().len(), 1);
    }
}
