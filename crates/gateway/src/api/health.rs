use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

// GET /health: liveness probe
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.machine.tools().len(),
        "threads": state.threads.list().len(),
        "cached_job_pages": state.job_cache.len(),
        "cached_event_pages": state.event_cache.len(),
    }))
}
