//! Per-key async locks.
//!
//! Every key maps to a `Semaphore(1)`. The cache uses one per URL so only
//! one caller fetches it while the rest queue and then find the entry
//! filled; the gateway uses one per conversation thread.

use std::collections::HashMap;
use std::sync::Arc;

use cp_domain::error::{Error, Result};
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive rights on `key`. Released on drop.
    pub async fn acquire(&self, key: &str) -> Result<OwnedSemaphorePermit> {
        let sem = {
            let mut locks = self.locks.lock();
            locks
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };
        sem.acquire_owned()
            .await
            .map_err(|_| Error::Other(format!("lock for {key} closed")))
    }

    pub fn key_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Drop locks nobody holds or waits on.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        locks.retain(|_, sem| Arc::strong_count(sem) > 1 || sem.available_permits() == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_acquire_waits_for_first() {
        let locks = Arc::new(KeyLocks::new());
        let permit = locks.acquire("k").await.unwrap();

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _p = locks2.acquire("k").await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(permit);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyLocks::new();
        let _a = locks.acquire("a").await.unwrap();
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b"))
            .await
            .expect("other key is free")
            .unwrap();
        assert_eq!(locks.key_count(), 2);
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = KeyLocks::new();
        let held = locks.acquire("held").await.unwrap();
        drop(locks.acquire("idle").await.unwrap());
        locks.prune_idle();
        assert_eq!(locks.key_count(), 1);
        drop(held);
        locks.prune_idle();
        assert_eq!(locks.key_count(), 0);
    }
}
