use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Profile memory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Inject the stored profile into the deciding prompt.
    #[serde(default = "d_true")]
    pub inject_profile: bool,
    /// Conversation text forwarded to the extractor is cut to the most
    /// recent `max_conversation_chars`.
    #[serde(default = "d_max_chars")]
    pub max_conversation_chars: usize,
    /// Used when a request carries no user id.
    #[serde(default = "d_user")]
    pub default_user_id: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            inject_profile: true,
            max_conversation_chars: d_max_chars(),
            default_user_id: d_user(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_true() -> bool {
    true
}
fn d_max_chars() -> usize {
    24_000
}
fn d_user() -> String {
    "anonymous".into()
}
