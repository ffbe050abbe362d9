use std::sync::Arc;

use cp_domain::error::Result;
use cp_domain::profile::UserProfile;
use cp_domain::tool::Message;

use crate::extractor::MemoryExtractor;
use crate::store::ProfileStore;

/// Outcome of one profile update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub changed: bool,
    /// The profile after the merge, if the user has one.
    pub profile: Option<UserProfile>,
}

impl ProfileUpdate {
    pub fn summary(&self) -> String {
        match (&self.profile, self.changed) {
            (Some(p), true) => format!("Profile updated.\n{}", p.to_prompt_block()),
            (Some(_), false) => "Profile already up to date; nothing new to remember.".into(),
            (None, _) => "Nothing to remember from this conversation yet.".into(),
        }
    }
}

/// Reconciles a conversation against the stored profile and merges the
/// result back.
pub struct ProfileUpdater {
    store: Arc<ProfileStore>,
    extractor: Arc<dyn MemoryExtractor>,
}

impl ProfileUpdater {
    pub fn new(store: Arc<ProfileStore>, extractor: Arc<dyn MemoryExtractor>) -> Self {
        Self { store, extractor }
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    pub async fn update(&self, user_id: &str, conversation: &[Message]) -> Result<ProfileUpdate> {
        let existing = self.store.get(user_id);
        let facts = self.extractor.reconcile(conversation, existing.as_ref()).await?;

        let changed = match facts {
            Some(facts) => self.store.upsert(user_id, &facts)?,
            None => false,
        };
        tracing::debug!(user_id = %user_id, changed, "profile reconciled");

        Ok(ProfileUpdate {
            changed,
            profile: self.store.get(user_id),
        })
    }
}
