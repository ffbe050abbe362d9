//! Building the application state from config.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cp_cache::{spawn_purger, KeyLocks, RetrievalCache};
use cp_domain::config::{Config, ConfigSeverity, GuardrailMode};
use cp_domain::records::{EventRecord, JobRecord};
use cp_extract::{Extractor, PageRenderer, WebDriverRenderer};
use cp_memory::{LlmMemoryExtractor, ProfileStore, ProfileUpdater};
use cp_providers::{GoogleProvider, LlmProvider};
use cp_sessions::ThreadStore;
use tokio::sync::Semaphore;

use crate::guardrail::{Guardrail, LlmBiasGuardrail, PassthroughGuardrail};
use crate::runtime::{ConversationMachine, MachineOptions};
use crate::search::{PineconeSearch, TavilySearch, Unavailable, VectorSearch, WebSearch};
use crate::state::AppState;
use crate::tools::{CareerGuidance, EventLookup, JobLookup, KnowledgeSearch, ProfileTool, ToolRegistry};

/// The external systems the runtime talks to.
pub struct Collaborators {
    pub llm: Arc<dyn LlmProvider>,
    pub renderer: Arc<dyn PageRenderer>,
    pub vector: Arc<dyn VectorSearch>,
    pub web: Arc<dyn WebSearch>,
    pub guardrail: Arc<dyn Guardrail>,
}

/// Build the production collaborators and assemble the state.
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }

    // ── Model ────────────────────────────────────────────────────────
    let llm: Arc<dyn LlmProvider> = Arc::new(
        GoogleProvider::from_config(&config.llm).context("initializing the model provider")?,
    );
    tracing::info!(provider = %llm.provider_id(), model = %config.llm.model, "model provider ready");

    // ── Page renderer ────────────────────────────────────────────────
    let renderer: Arc<dyn PageRenderer> = Arc::new(
        WebDriverRenderer::new(config.extract.clone()).context("initializing the page renderer")?,
    );

    // ── Search collaborators ─────────────────────────────────────────
    // Missing search credentials degrade the matching tool, not startup.
    let vector: Arc<dyn VectorSearch> = match PineconeSearch::new(&config.search.pinecone, llm.clone()) {
        Ok(search) => Arc::new(search),
        Err(e) => {
            tracing::warn!(error = %e, "knowledge base search disabled");
            Arc::new(Unavailable::new("knowledge base search", e.to_string()))
        }
    };
    let web: Arc<dyn WebSearch> = match TavilySearch::new(&config.search.tavily) {
        Ok(search) => Arc::new(search),
        Err(e) => {
            tracing::warn!(error = %e, "web search disabled");
            Arc::new(Unavailable::new("web search", e.to_string()))
        }
    };

    let guardrail: Arc<dyn Guardrail> = match config.guardrail.mode {
        GuardrailMode::Passthrough => Arc::new(PassthroughGuardrail),
        GuardrailMode::Model => Arc::new(LlmBiasGuardrail::new(llm.clone(), config.guardrail.bias_threshold)),
    };

    assemble(
        config,
        Collaborators {
            llm,
            renderer,
            vector,
            web,
            guardrail,
        },
    )
}

/// Wire stores, caches, tools and the state machine around `parts`.
pub fn assemble(config: Arc<Config>, parts: Collaborators) -> anyhow::Result<AppState> {
    let state_cfg = &config.state;

    // ── Stores ───────────────────────────────────────────────────────
    let threads = Arc::new(
        ThreadStore::new(&state_cfg.threads_path(), state_cfg.history_limit)
            .context("initializing thread store")?,
    );
    let profiles = Arc::new(
        ProfileStore::new(&state_cfg.profiles_path()).context("initializing profile store")?,
    );

    // ── Listing caches ───────────────────────────────────────────────
    let ttl = config.cache.ttl();
    let mut job_cache = RetrievalCache::<JobRecord>::new("jobs", ttl);
    let mut event_cache = RetrievalCache::<EventRecord>::new("events", ttl);
    if config.cache.persist {
        let dir = state_cfg.cache_dir();
        job_cache = job_cache.persistent(&dir).context("loading job cache")?;
        event_cache = event_cache.persistent(&dir).context("loading event cache")?;
    }
    let job_cache = Arc::new(job_cache);
    let event_cache = Arc::new(event_cache);
    tracing::info!(
        ttl_hours = config.cache.ttl_hours,
        jobs = job_cache.len(),
        events = event_cache.len(),
        "listing caches ready"
    );

    // ── Tools ────────────────────────────────────────────────────────
    let extractor = Extractor::new(parts.renderer);
    let memory = Arc::new(LlmMemoryExtractor::new(
        parts.llm.clone(),
        config.memory.max_conversation_chars,
    ));
    let updater = Arc::new(ProfileUpdater::new(profiles.clone(), memory));

    let tools = ToolRegistry::new()
        .with(Arc::new(KnowledgeSearch::new(parts.vector)))
        .with(Arc::new(JobLookup::new(
            config.extract.jobs_url.clone(),
            job_cache.clone(),
            extractor.clone(),
        )))
        .with(Arc::new(CareerGuidance::new(parts.web)))
        .with(Arc::new(EventLookup::new(
            config.extract.events_url.clone(),
            event_cache.clone(),
            extractor,
        )))
        .with(Arc::new(ProfileTool::new(updater)));
    tracing::info!(tools = tools.len(), "tool registry ready");

    // ── State machine ────────────────────────────────────────────────
    let machine = Arc::new(ConversationMachine::new(
        parts.llm,
        Arc::new(tools),
        profiles.clone(),
        MachineOptions {
            inject_profile: config.memory.inject_profile,
            temperature: config.llm.temperature,
        },
    ));

    Ok(AppState {
        turn_slots: Arc::new(Semaphore::new(config.server.max_concurrent_turns.max(1))),
        config,
        machine,
        guardrail: parts.guardrail,
        threads,
        thread_locks: Arc::new(KeyLocks::new()),
        profiles,
        job_cache,
        event_cache,
    })
}

/// Spawn the long-running maintenance loops.
pub fn spawn_background_tasks(state: &AppState) {
    let every = Duration::from_secs(state.config.cache.purge_interval_secs.max(1));

    // ── Expired cache purge ──────────────────────────────────────────
    spawn_purger(state.job_cache.clone(), every);
    spawn_purger(state.event_cache.clone(), every);

    // ── Periodic store flush and lock pruning ────────────────────────
    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                state.flush_all();
                state.thread_locks.prune_idle();
            }
        });
    }
}
