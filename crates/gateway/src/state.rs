use std::sync::Arc;

use cp_cache::{KeyLocks, RetrievalCache};
use cp_domain::config::Config;
use cp_domain::records::{EventRecord, JobRecord};
use cp_memory::ProfileStore;
use cp_sessions::ThreadStore;
use tokio::sync::Semaphore;

use crate::guardrail::Guardrail;
use crate::runtime::ConversationMachine;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub machine: Arc<ConversationMachine>,
    pub guardrail: Arc<dyn Guardrail>,

    // ── Conversation state ────────────────────────────────────────────
    pub threads: Arc<ThreadStore>,
    /// One turn at a time per thread.
    pub thread_locks: Arc<KeyLocks>,
    pub profiles: Arc<ProfileStore>,
    /// Turns running across all threads.
    pub turn_slots: Arc<Semaphore>,

    // ── Listing caches ────────────────────────────────────────────────
    pub job_cache: Arc<RetrievalCache<JobRecord>>,
    pub event_cache: Arc<RetrievalCache<EventRecord>>,
}

impl AppState {
    /// Persist every store. Failures are logged, not returned.
    pub fn flush_all(&self) {
        if let Err(e) = self.threads.flush() {
            tracing::warn!(error = %e, "thread store flush failed");
        }
        if let Err(e) = self.profiles.flush() {
            tracing::warn!(error = %e, "profile store flush failed");
        }
        for (name, result) in [
            (self.job_cache.name(), self.job_cache.flush()),
            (self.event_cache.name(), self.event_cache.flush()),
        ] {
            if let Err(e) = result {
                tracing::warn!(cache = %name, error = %e, "cache flush failed");
            }
        }
    }
}
