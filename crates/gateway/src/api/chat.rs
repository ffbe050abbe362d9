//! `POST /chat`: run one turn and stream its payloads as server-sent events.

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use futures_util::stream::Stream;
use serde::Deserialize;

use cp_domain::stream::StreamPayload;

use crate::runtime::{run_turn, TurnInput};
use crate::state::AppState;

/// Response header carrying the thread id, so callers that did not send
/// one can continue the conversation.
pub const THREAD_HEADER: &str = "x-thread-id";

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ChatBody {
    /// Resolve defaults: the configured anonymous user and a fresh thread.
    pub fn into_input(self, default_user: &str) -> TurnInput {
        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        TurnInput {
            user_id: non_blank(self.user_id).unwrap_or_else(|| default_user.to_string()),
            thread_id: non_blank(self.thread_id).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            query: self.query.trim().to_string(),
        }
    }
}

pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> Response {
    if body.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No message provided" })),
        )
            .into_response();
    }

    let input = body.into_input(&state.config.memory.default_user_id);
    let thread_id = input.thread_id.clone();
    tracing::info!(thread_id = %thread_id, user_id = %input.user_id, "chat turn");

    let rx = run_turn(state, input);
    let mut resp = Sse::new(make_sse_stream(rx))
        .keep_alive(KeepAlive::default())
        .into_response();
    if let Ok(v) = HeaderValue::from_str(&thread_id) {
        resp.headers_mut().insert(THREAD_HEADER, v);
    }
    resp
}

fn make_sse_stream(
    mut rx: tokio::sync::mpsc::Receiver<StreamPayload>,
) -> impl Stream<Item = Result<Event, std::convert::Infallible>> {
    async_stream::stream! {
        while let Some(payload) = rx.recv().await {
            yield Ok(Event::default().data(payload.to_json()));
        }
    }
}
