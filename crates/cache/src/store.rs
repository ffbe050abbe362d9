//! The retrieval cache itself.

use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use cp_domain::error::{Error, Result};
use cp_domain::trace::TraceEvent;

use crate::clock::{Clock, SystemClock};
use crate::key::canonicalize;
use crate::locks::KeyLocks;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cache entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One cached result set. Never modified after insertion; a later fetch
/// replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: Vec<T>,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Retrieval cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct RetrievalCache<T> {
    name: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    locks: KeyLocks,
    /// JSON snapshot written after every insert and purge.
    persist_path: Option<PathBuf>,
}

impl<T> RetrievalCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// An in-memory cache on the system clock.
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self::with_clock(name, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(name: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
            locks: KeyLocks::new(),
            persist_path: None,
        }
    }

    /// Back the cache with `dir/<name>.json`, loading whatever unexpired
    /// entries the file already holds.
    pub fn persistent(mut self, dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.name));

        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let stored: HashMap<String, CacheEntry<T>> = match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(cache = %self.name, error = %e, "discarding unreadable cache file");
                    HashMap::new()
                }
            };
            let now = self.clock.now();
            let fresh: HashMap<_, _> = stored.into_iter().filter(|(_, e)| e.is_fresh(now)).collect();
            tracing::info!(cache = %self.name, entries = fresh.len(), "loaded cache");
            *self.entries.write() = fresh;
        }

        self.persist_path = Some(path);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// The unexpired entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        let key = canonicalize(key);
        self.fresh(&key)
    }

    /// Return the cached payload for `key`, or run `fetch` and cache its
    /// result. At most one `fetch` per key runs at a time; concurrent callers
    /// for the same key wait for it and share its result. A failed fetch
    /// leaves the cache untouched.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let key = canonicalize(key);
        if let Some(entry) = self.fresh(&key) {
            self.hit(&key, &entry);
            return Ok(entry.payload);
        }

        let _permit = self.locks.acquire(&key).await?;

        // Filled by the fetch we were queued behind.
        if let Some(entry) = self.fresh(&key) {
            self.hit(&key, &entry);
            return Ok(entry.payload);
        }

        TraceEvent::CacheMiss {
            cache: self.name.clone(),
            key: key.clone(),
        }
        .emit();

        let payload = fetch().await?;
        let now = self.clock.now();
        self.entries.write().insert(
            key.clone(),
            CacheEntry {
                key,
                payload: payload.clone(),
                fetched_at: now,
                expires_at: now + self.ttl,
            },
        );
        self.flush_logged();
        Ok(payload)
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, e| e.is_fresh(now));
            before - entries.len()
        };
        self.locks.prune_idle();
        if removed > 0 {
            TraceEvent::CachePurged {
                cache: self.name.clone(),
                removed,
            }
            .emit();
            self.flush_logged();
        }
        removed
    }

    /// Persist the current entries. A no-op for in-memory caches.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let json = {
            let entries = self.entries.read();
            serde_json::to_string_pretty(&*entries)?
        };
        let dir = path
            .parent()
            .ok_or_else(|| Error::Other(format!("cache path {} has no parent", path.display())))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn flush_logged(&self) {
        if let Err(e) = self.flush() {
            tracing::warn!(cache = %self.name, error = %e, "cache flush failed");
        }
    }

    fn fresh(&self, key: &str) -> Option<CacheEntry<T>> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(key)
            .filter(|e| e.is_fresh(now))
            .cloned()
    }

    fn hit(&self, key: &str, entry: &CacheEntry<T>) {
        TraceEvent::CacheHit {
            cache: self.name.clone(),
            key: key.to_string(),
            records: entry.payload.len(),
        }
        .emit();
    }
}

/// Purge `cache` every `every` until the returned handle is aborted.
pub fn spawn_purger<T>(cache: Arc<RetrievalCache<T>>, every: StdDuration) -> tokio::task::JoinHandle<()>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.purge_expired();
            tracing::debug!(cache = %cache.name(), removed, "purge pass");
        }
    })
}
