//! Pinecone query API, with query vectors from the model's embeddings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cp_domain::config::PineconeConfig;
use cp_domain::error::{Error, Result};
use cp_domain::trace::TraceEvent;
use cp_providers::util::{error_for_status, from_reqwest, resolve_api_key};
use cp_providers::{EmbeddingsRequest, LlmProvider};
use serde_json::{json, Map, Value};

use super::{SearchHit, VectorSearch};

/// Metadata keys that hold the indexed text rather than a job field.
const CONTENT_KEYS: &[&str] = &["text", "content", "page_content"];

pub struct PineconeSearch {
    http: reqwest::Client,
    index_host: String,
    namespace: Option<String>,
    top_k: u32,
    api_key: String,
    embedder: Arc<dyn LlmProvider>,
}

impl PineconeSearch {
    pub fn new(cfg: &PineconeConfig, embedder: Arc<dyn LlmProvider>) -> Result<Self> {
        if cfg.index_host.trim().is_empty() {
            return Err(Error::Config("search.pinecone.index_host is empty".into()));
        }
        let api_key = resolve_api_key(&cfg.auth)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            index_host: cfg.index_host.trim_end_matches('/').to_owned(),
            namespace: cfg.namespace.clone().filter(|n| !n.is_empty()),
            top_k: cfg.top_k.max(1),
            api_key,
            embedder,
        })
    }

    async fn embed(&self, query: &str) -> Result<Vec<f32>> {
        let resp = self
            .embedder
            .embeddings(EmbeddingsRequest {
                input: vec![query.to_string()],
                model: None,
            })
            .await?;
        resp.embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other("embedding response was empty".into()))
    }
}

#[async_trait]
impl VectorSearch for PineconeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let vector = self.embed(query).await?;

        let mut body = json!({
            "vector": vector,
            "topK": self.top_k,
            "includeMetadata": true,
        });
        if let Some(ns) = &self.namespace {
            body["namespace"] = Value::String(ns.clone());
        }

        let start = Instant::now();
        let resp = self
            .http
            .post(format!("{}/query", self.index_host))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;
        let status = resp.status().as_u16();
        let resp = error_for_status("pinecone", resp).await?;
        let parsed: Value = resp.json().await.map_err(from_reqwest)?;
        let hits = parse_matches(&parsed);

        TraceEvent::SearchCall {
            backend: "pinecone".into(),
            status,
            results: hits.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();
        Ok(hits)
    }
}

/// Turn a query response's `matches` into hits, lifting the stored text out
/// of the metadata.
pub fn parse_matches(body: &Value) -> Vec<SearchHit> {
    let Some(matches) = body.get("matches").and_then(Value::as_array) else {
        return Vec::new();
    };
    matches
        .iter()
        .map(|m| {
            let mut metadata: Map<String, Value> = m
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let content = CONTENT_KEYS.iter().find_map(|k| match metadata.remove(*k) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
                _ => None,
            });
            SearchHit {
                metadata,
                content,
                score: m.get("score").and_then(Value::as_f64),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_metadata_becomes_content() {
        let body = json!({
            "matches": [
                {
                    "id": "job-1",
                    "score": 0.91,
                    "metadata": {
                        "title": "Data Analyst",
                        "company": "Acme",
                        "text": "Analyse sales data"
                    }
                },
                { "id": "job-2", "metadata": { "title": "Designer" } }
            ]
        });
        let hits = parse_matches(&body);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content.as_deref(), Some("Analyse sales data"));
        assert!(!hits[0].metadata.contains_key("text"));
        assert_eq!(hits[0].metadata["company"], "Acme");
        assert_eq!(hits[0].score, Some(0.91));
        assert!(hits[1].content.is_none());
    }

    #[test]
    fn missing_matches_is_empty() {
        assert!(parse_matches(&json!({"namespace": ""})).is_empty());
    }
}
