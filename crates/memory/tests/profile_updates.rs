use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use cp_domain::error::{Error, Result};
use cp_domain::profile::UserProfile;
use cp_domain::tool::Message;
use cp_memory::{LlmMemoryExtractor, MemoryExtractor, ProfileStore, ProfileUpdater};
use cp_providers::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};

/// Replies with canned content and records every request.
struct CannedLlm {
    reply: String,
    seen: Mutex<Vec<ChatRequest>>,
}

impl CannedLlm {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for CannedLlm {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.seen.lock().push(req.clone());
        Ok(ChatResponse {
            content: self.reply.clone(),
            ..Default::default()
        })
    }

    async fn embeddings(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        Err(Error::Other("not used".into()))
    }

    fn provider_id(&self) -> &str {
        "canned"
    }
}

fn conversation() -> Vec<Message> {
    vec![
        Message::user("Hi, I'm Asha. I prefer remote roles and I'm good at Tableau."),
        Message::assistant("Noted!"),
    ]
}

#[tokio::test]
async fn extractor_asks_for_schema_constrained_json() {
    let llm = CannedLlm::new(r#"{"name":"Asha","preferred_work_mode":"remote","special_skills":["Tableau"]}"#);
    let extractor = LlmMemoryExtractor::new(llm.clone(), 10_000);

    let facts = extractor.reconcile(&conversation(), None).await.unwrap().unwrap();
    assert_eq!(facts.name.as_deref(), Some("Asha"));
    assert_eq!(facts.special_skills, vec!["Tableau"]);

    let seen = llm.seen.lock();
    let req = &seen[0];
    assert!(req.tools.is_empty());
    assert!(req.response_schema.as_ref().unwrap()["properties"]["special_skills"].is_object());
    let transcript = req.messages[1].content.extract_all_text();
    assert!(transcript.starts_with("user: Hi, I'm Asha"));
    assert!(transcript.contains("assistant: Noted!"));
}

#[tokio::test]
async fn empty_facts_mean_nothing_to_remember() {
    let extractor = LlmMemoryExtractor::new(CannedLlm::new("{}"), 10_000);
    assert!(extractor.reconcile(&conversation(), None).await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_facts_are_an_error() {
    let extractor = LlmMemoryExtractor::new(CannedLlm::new("the user is Asha"), 10_000);
    let err = extractor.reconcile(&conversation(), None).await.unwrap_err();
    assert!(matches!(err, Error::Extract(_)));
}

#[tokio::test]
async fn known_profile_is_shown_to_the_extractor() {
    let llm = CannedLlm::new("{}");
    let extractor = LlmMemoryExtractor::new(llm.clone(), 10_000);
    let known = UserProfile {
        preferred_name: Some("Ash".into()),
        ..Default::default()
    };
    extractor.reconcile(&conversation(), Some(&known)).await.unwrap();
    let system = llm.seen.lock()[0].messages[0].content.extract_all_text();
    assert!(system.contains("- Preferred name: Ash"));
}

#[tokio::test]
async fn updater_merges_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profiles").join("profiles.json");
    let store = Arc::new(ProfileStore::new(&path).unwrap());
    let llm = CannedLlm::new(r#"{"special_skills":["Tableau"],"other_preferences":["fintech roles"]}"#);
    let updater = ProfileUpdater::new(store.clone(), Arc::new(LlmMemoryExtractor::new(llm, 10_000)));

    let first = updater.update("asha", &conversation()).await.unwrap();
    assert!(first.changed);
    assert!(first.summary().starts_with("Profile updated."));

    let second = updater.update("asha", &conversation()).await.unwrap();
    assert!(!second.changed);
    assert!(second.summary().contains("nothing new"));

    let reloaded = ProfileStore::new(&path).unwrap();
    let profile = reloaded.get("asha").unwrap();
    assert_eq!(profile.other_preferences, vec!["fintech roles"]);
}

#[tokio::test]
async fn nothing_new_for_unknown_user_is_not_an_error() {
    let store = Arc::new(ProfileStore::in_memory());
    let updater = ProfileUpdater::new(store.clone(), Arc::new(LlmMemoryExtractor::new(CannedLlm::new("{}"), 100)));
    let outcome = updater.update("new-user", &conversation()).await.unwrap();
    assert!(!outcome.changed);
    assert!(outcome.profile.is_none());
    assert!(store.is_empty());
}
