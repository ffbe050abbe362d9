//! Profile store.
//!
//! Persists every user's profile in `profiles.json` under the configured
//! state path, keyed by the namespace `users/<user_id>/profile`. Profiles are
//! only ever merged into, never replaced or cleared.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use cp_domain::error::{Error, Result};
use cp_domain::profile::UserProfile;
use cp_domain::trace::TraceEvent;

pub fn profile_namespace(user_id: &str) -> String {
    format!("users/{user_id}/profile")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredProfile {
    profile: UserProfile,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct ProfileStore {
    path: Option<PathBuf>,
    profiles: RwLock<HashMap<String, StoredProfile>>,
}

impl ProfileStore {
    /// Load or create the store at `path`.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let profiles = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "profile file unreadable, starting empty");
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            profiles: RwLock::new(profiles),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles
            .read()
            .get(&profile_namespace(user_id))
            .map(|s| s.profile.clone())
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }

    /// Merge `incoming` into the user's profile, creating it on first use.
    ///
    /// An empty `incoming` never creates a profile. Returns whether the stored
    /// profile changed.
    pub fn upsert(&self, user_id: &str, incoming: &UserProfile) -> Result<bool> {
        let key = profile_namespace(user_id);
        let changed = {
            let mut profiles = self.profiles.write();
            match profiles.get_mut(&key) {
                Some(stored) => {
                    let changed = stored.profile.merge(incoming);
                    if changed {
                        stored.updated_at = Utc::now();
                    }
                    changed
                }
                None => {
                    let mut profile = UserProfile::default();
                    let changed = profile.merge(incoming);
                    if changed {
                        let now = Utc::now();
                        profiles.insert(
                            key,
                            StoredProfile {
                                profile,
                                created_at: now,
                                updated_at: now,
                            },
                        );
                    }
                    changed
                }
            }
        };

        TraceEvent::ProfileMerged {
            user_id: user_id.to_string(),
            changed,
        }
        .emit();

        if changed {
            self.flush()?;
        }
        Ok(changed)
    }

    /// Persist the store to disk.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = {
            let profiles = self.profiles.read();
            serde_json::to_string_pretty(&*profiles)?
        };
        let dir = path
            .parent()
            .ok_or_else(|| Error::Other(format!("profile path {} has no parent", path.display())))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(list: &[&str]) -> UserProfile {
        UserProfile {
            special_skills: list.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn namespace_is_per_user() {
        assert_eq!(profile_namespace("u-17"), "users/u-17/profile");
    }

    #[test]
    fn first_upsert_creates_profile() {
        let store = ProfileStore::in_memory();
        assert!(store.get("asha").is_none());
        assert!(store.upsert("asha", &skills(&["Python"])).unwrap());
        assert_eq!(store.get("asha").unwrap().special_skills, vec!["Python"]);
    }

    #[test]
    fn empty_upsert_creates_nothing() {
        let store = ProfileStore::in_memory();
        assert!(!store.upsert("asha", &UserProfile::default()).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn repeated_facts_report_no_change() {
        let store = ProfileStore::in_memory();
        store.upsert("asha", &skills(&["SQL"])).unwrap();
        assert!(!store.upsert("asha", &skills(&["sql"])).unwrap());
    }

    #[test]
    fn users_are_isolated() {
        let store = ProfileStore::in_memory();
        store.upsert("a", &skills(&["Go"])).unwrap();
        store.upsert("b", &skills(&["Rust"])).unwrap();
        assert_eq!(store.get("a").unwrap().special_skills, vec!["Go"]);
        assert_eq!(store.get("b").unwrap().special_skills, vec!["Rust"]);
    }
}
