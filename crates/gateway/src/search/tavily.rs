//! Tavily web search.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use cp_domain::config::TavilyConfig;
use cp_domain::error::{Error, Result};
use cp_domain::trace::TraceEvent;
use cp_providers::util::{error_for_status, from_reqwest, resolve_api_key};
use serde_json::{json, Value};

use super::WebSearch;

pub struct TavilySearch {
    http: reqwest::Client,
    base_url: String,
    max_results: u32,
    api_key: String,
}

impl TavilySearch {
    pub fn new(cfg: &TavilyConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            max_results: cfg.max_results.max(1),
            api_key,
        })
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str) -> Result<String> {
        let start = Instant::now();
        let resp = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query": query,
                "max_results": self.max_results,
                "search_depth": "basic",
            }))
            .send()
            .await
            .map_err(from_reqwest)?;
        let status = resp.status().as_u16();
        let resp = error_for_status("tavily", resp).await?;
        let body: Value = resp.json().await.map_err(from_reqwest)?;

        let results = body.get("results").cloned().unwrap_or(Value::Array(Vec::new()));
        TraceEvent::SearchCall {
            backend: "tavily".into(),
            status,
            results: results.as_array().map(Vec::len).unwrap_or(0),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();
        render_results(&results)
    }
}

/// The result list as the model sees it: the raw JSON array.
pub fn render_results(results: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_are_passed_through_unchanged() {
        let results = json!([
            { "title": "How to become a data scientist", "url": "https://example.com/ds", "content": "Learn Python", "score": 0.8 }
        ]);
        let text = render_results(&results).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, results);
    }
}
