use serde::Serialize;

/// Structured trace events emitted across all careerpath crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    CacheHit {
        cache: String,
        key: String,
        records: usize,
    },
    CacheMiss {
        cache: String,
        key: String,
    },
    CachePurged {
        cache: String,
        removed: usize,
    },
    PageRendered {
        url: String,
        html_chars: usize,
        timed_out: bool,
        duration_ms: u64,
    },
    CardsExtracted {
        kind: String,
        cards_seen: usize,
        accepted: usize,
    },
    ToolDispatched {
        tool_name: String,
        call_id: String,
        is_error: bool,
        result_chars: usize,
        duration_ms: u64,
    },
    ProfileMerged {
        user_id: String,
        changed: bool,
    },
    LlmRequest {
        provider: String,
        model: String,
        with_tools: bool,
        with_schema: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    SearchCall {
        backend: String,
        status: u16,
        results: usize,
        duration_ms: u64,
    },
    TurnFinished {
        thread_id: String,
        steps: usize,
        errored: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "cp_event");
    }
}
