use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Retrieval cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "d_ttl_hours")]
    pub ttl_hours: u64,
    /// How often expired entries are physically removed.
    #[serde(default = "d_purge_interval")]
    pub purge_interval_secs: u64,
    /// Persist entries to the state directory.
    #[serde(default = "d_true")]
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: d_ttl_hours(),
            purge_interval_secs: d_purge_interval(),
            persist: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours as i64)
    }
}

fn d_ttl_hours() -> u64 {
    24
}
fn d_purge_interval() -> u64 {
    600
}
fn d_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_defaults_to_a_day() {
        let cfg = CacheConfig::default();
        assert_eq!(cfg.ttl(), chrono::Duration::hours(24));
        assert!(cfg.persist);
    }
}
