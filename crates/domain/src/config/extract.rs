use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Page rendering and extraction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// WebDriver endpoint (chromedriver, geckodriver, selenium grid).
    #[serde(default = "d_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "d_jobs_url")]
    pub jobs_url: String,
    #[serde(default = "d_events_url")]
    pub events_url: String,
    /// Upper bound on waiting for the first card to appear.
    #[serde(default = "d_wait_timeout")]
    pub wait_timeout_secs: u64,
    /// Pause after the cards appear, for late client-side rendering.
    #[serde(default = "d_settle_delay")]
    pub settle_delay_ms: u64,
    #[serde(default = "d_poll_interval")]
    pub poll_interval_ms: u64,
    /// Where screenshots are written when the wait times out.
    #[serde(default = "d_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    #[serde(default = "d_true")]
    pub headless: bool,
    #[serde(default = "d_user_agent")]
    pub user_agent: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            webdriver_url: d_webdriver_url(),
            jobs_url: d_jobs_url(),
            events_url: d_events_url(),
            wait_timeout_secs: d_wait_timeout(),
            settle_delay_ms: d_settle_delay(),
            poll_interval_ms: d_poll_interval(),
            snapshot_dir: d_snapshot_dir(),
            headless: true,
            user_agent: d_user_agent(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn d_jobs_url() -> String {
    "https://www.herkey.com/jobs".into()
}
fn d_events_url() -> String {
    "https://events.herkey.com/events".into()
}
fn d_wait_timeout() -> u64 {
    30
}
fn d_settle_delay() -> u64 {
    3_000
}
fn d_poll_interval() -> u64 {
    500
}
fn d_snapshot_dir() -> PathBuf {
    PathBuf::from("./data/snapshots")
}
fn d_true() -> bool {
    true
}
fn d_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_defaults() {
        let cfg: ExtractConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.wait_timeout_secs, 30);
        assert_eq!(cfg.settle_delay_ms, 3_000);
        assert!(cfg.headless);
        assert_eq!(cfg.jobs_url, "https://www.herkey.com/jobs");
    }
}
