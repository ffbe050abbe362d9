use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use cp_cache::{canonical_url, Clock, ManualClock, RetrievalCache};
use cp_domain::error::Error;

const JOBS: &str = "https://www.herkey.com/jobs/search";

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()))
}

fn cache(clock: Arc<ManualClock>) -> RetrievalCache<String> {
    RetrievalCache::with_clock("jobs", Duration::hours(24), clock)
}

fn counted(calls: &Arc<AtomicUsize>, payload: &[&str]) -> impl std::future::Future<Output = cp_domain::error::Result<Vec<String>>> {
    calls.fetch_add(1, Ordering::SeqCst);
    let payload: Vec<String> = payload.iter().map(|s| s.to_string()).collect();
    async move { Ok(payload) }
}

#[tokio::test]
async fn second_lookup_within_ttl_is_served_from_cache() {
    let cache = cache(clock());
    let calls = Arc::new(AtomicUsize::new(0));

    let first = cache.get_or_fetch(JOBS, || counted(&calls, &["a", "b"])).await.unwrap();
    let second = cache.get_or_fetch(JOBS, || counted(&calls, &["c"])).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_lookups_share_one_fetch() {
    let cache = Arc::new(cache(clock()));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_fetch(JOBS, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(StdDuration::from_millis(50)).await;
                    Ok(vec!["job".to_string()])
                })
                .await
                .unwrap()
        }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap(), vec!["job"]);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_entry_is_refetched() {
    let clock = clock();
    let cache = cache(clock.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    cache.get_or_fetch(JOBS, || counted(&calls, &["old"])).await.unwrap();
    clock.advance(Duration::hours(23));
    cache.get_or_fetch(JOBS, || counted(&calls, &["new"])).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::hours(2));
    let fresh = cache.get_or_fetch(JOBS, || counted(&calls, &["new"])).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(fresh, vec!["new"]);

    let entry = cache.get(JOBS).unwrap();
    assert_eq!(entry.expires_at - entry.fetched_at, Duration::hours(24));
    assert_eq!(entry.fetched_at, clock.now());
}

#[tokio::test]
async fn parameter_order_hits_the_same_entry() {
    let cache = cache(clock());
    let calls = Arc::new(AtomicUsize::new(0));

    let a = canonical_url(JOBS, &[("job_type", Some("full-time")), ("work_mode", Some("hybrid"))]);
    cache.get_or_fetch(&a, || counted(&calls, &["x"])).await.unwrap();

    let reordered = format!("{JOBS}?work_mode=hybrid&job_type=full-time");
    cache.get_or_fetch(&reordered, || counted(&calls, &["y"])).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn failed_fetch_is_not_cached() {
    let cache = cache(clock());
    let calls = Arc::new(AtomicUsize::new(0));

    let err = cache
        .get_or_fetch(JOBS, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Timeout("cards never appeared".into()))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
    assert!(cache.is_empty());

    let ok = cache.get_or_fetch(JOBS, || counted(&calls, &["ok"])).await.unwrap();
    assert_eq!(ok, vec!["ok"]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_result_is_cached() {
    let cache = cache(clock());
    let calls = Arc::new(AtomicUsize::new(0));
    cache.get_or_fetch(JOBS, || counted(&calls, &[])).await.unwrap();
    let again = cache.get_or_fetch(JOBS, || counted(&calls, &["late"])).await.unwrap();
    assert!(again.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn purge_drops_only_expired_entries() {
    let clock = clock();
    let cache = cache(clock.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    cache.get_or_fetch("https://a.example/x", || counted(&calls, &["1"])).await.unwrap();
    clock.advance(Duration::hours(20));
    cache.get_or_fetch("https://b.example/y", || counted(&calls, &["2"])).await.unwrap();
    clock.advance(Duration::hours(5));

    assert_eq!(cache.purge_expired(), 1);
    assert!(cache.get("https://a.example/x").is_none());
    assert!(cache.get("https://b.example/y").is_some());
}

#[tokio::test]
async fn entries_survive_reload_until_they_expire() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    let calls = Arc::new(AtomicUsize::new(0));

    {
        let cache = cache(clock.clone()).persistent(dir.path()).unwrap();
        cache.get_or_fetch(JOBS, || counted(&calls, &["kept"])).await.unwrap();
    }
    assert!(dir.path().join("jobs.json").exists());

    let reloaded = cache(clock.clone()).persistent(dir.path()).unwrap();
    let got = reloaded.get_or_fetch(JOBS, || counted(&calls, &["refetched"])).await.unwrap();
    assert_eq!(got, vec!["kept"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::hours(25));
    let expired = cache(clock).persistent(dir.path()).unwrap();
    assert!(expired.is_empty());
}

#[tokio::test]
async fn unreadable_cache_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("jobs.json"), "{not json").unwrap();
    let cache = cache(clock()).persistent(dir.path()).unwrap();
    assert!(cache.is_empty());
}
