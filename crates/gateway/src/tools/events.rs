//! Upcoming community events.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use cp_cache::{canonical_url, RetrievalCache};
use cp_domain::records::EventRecord;
use cp_domain::tool::ToolDefinition;
use cp_extract::Extractor;
use serde_json::{json, Value};

use super::{args, format, ToolContext, ToolHandler, ToolKind};

pub struct EventLookup {
    events_url: String,
    cache: Arc<RetrievalCache<EventRecord>>,
    extractor: Extractor,
}

impl EventLookup {
    pub fn new(
        events_url: impl Into<String>,
        cache: Arc<RetrievalCache<EventRecord>>,
        extractor: Extractor,
    ) -> Self {
        Self {
            events_url: events_url.into(),
            cache,
            extractor,
        }
    }

    pub fn page_url(&self, keyword: Option<&str>) -> String {
        let base = self.events_url.trim_end_matches('/');
        match keyword {
            None => base.to_string(),
            Some(_) => canonical_url(&format!("{base}/search"), &[("keyword", keyword)]),
        }
    }
}

#[async_trait]
impl ToolHandler for EventLookup {
    fn kind(&self) -> ToolKind {
        ToolKind::EventLookup
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.kind().name().into(),
            description: "List upcoming HerKey community events: webinars, workshops, \
                          meetups and mentoring sessions."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "keyword": {
                        "type": "string",
                        "description": "Optional topic to narrow the events, e.g. leadership.",
                    }
                }
            }),
        }
    }

    async fn call(&self, _ctx: &ToolContext, raw: &Value) -> anyhow::Result<String> {
        let map = args::object(raw)?;
        let keyword = args::optional(&map, "keyword")?;
        let url = self.page_url(keyword.as_deref());
        tracing::debug!(url = %url, "event lookup");

        let extractor = self.extractor.clone();
        let page = url.clone();
        let records = self
            .cache
            .get_or_fetch(&url, move || async move { extractor.events(&page).await })
            .await
            .with_context(|| format!("event lookup for {url}"))?;
        Ok(format::events(&records))
    }
}
