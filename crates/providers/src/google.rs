//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` and `batchEmbedContents` APIs.
//! Auth is via an API key passed as a query parameter (`key={api_key}`).

use crate::traits::{
    ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider, Usage,
};
use crate::util::{error_for_status, from_reqwest, redact_url_key, resolve_api_key};
use cp_domain::config::LlmConfig;
use cp_domain::error::{Error, Result};
use cp_domain::tool::{
    parse_arguments, ContentPart, Message, MessageContent, Role, ToolCall, ToolDefinition,
};
use cp_domain::trace::TraceEvent;
use serde_json::Value;
use std::time::Instant;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An LLM provider adapter for the Google Gemini API.
pub struct GoogleProvider {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    embedding_model: String,
    embedding_dimensions: u32,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl GoogleProvider {
    /// Create a new provider from the deserialized LLM config.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.provider_id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model: cfg.model.clone(),
            embedding_model: cfg.embedding_model.clone(),
            embedding_dimensions: cfg.embedding_dimensions,
            temperature: cfg.temperature,
            client,
        })
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let mut contents: Vec<Value> = Vec::new();
        let mut system_text: Vec<String> = Vec::new();

        for msg in &req.messages {
            match msg.role {
                // Error markers from earlier turns are not instructions.
                Role::System if msg.error_message().is_some() => {}
                Role::System => system_text.push(msg.content.extract_all_text()),
                Role::User => contents.push(user_to_gemini(msg)),
                Role::Assistant => contents.push(assistant_to_gemini(msg)),
                Role::Tool => contents.push(tool_result_to_gemini(msg)),
            }
        }

        let mut body = serde_json::json!({
            "contents": contents,
        });

        if !system_text.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{"text": system_text.join("\n\n")}]
            });
        }

        if !req.tools.is_empty() {
            let function_declarations: Vec<Value> = req.tools.iter().map(tool_to_gemini).collect();
            body["tools"] = serde_json::json!([{
                "functionDeclarations": function_declarations,
            }]);
        }

        // Generation config.
        let mut gen_config = serde_json::json!({});
        if let Some(temp) = req.temperature.or(self.temperature) {
            gen_config["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = req.max_tokens {
            gen_config["maxOutputTokens"] = serde_json::json!(max);
        }
        if let Some(schema) = &req.response_schema {
            gen_config["responseMimeType"] = serde_json::json!("application/json");
            gen_config["responseSchema"] = sanitize_schema(schema);
        }
        if gen_config.as_object().is_some_and(|o| !o.is_empty()) {
            body["generationConfig"] = gen_config;
        }

        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message serialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn user_to_gemini(msg: &Message) -> Value {
    serde_json::json!({
        "role": "user",
        "parts": [{"text": msg.content.extract_all_text()}],
    })
}

fn assistant_to_gemini(msg: &Message) -> Value {
    let mut parts: Vec<Value> = Vec::new();
    match &msg.content {
        MessageContent::Text(t) => {
            parts.push(serde_json::json!({"text": t}));
        }
        MessageContent::Parts(ps) => {
            for p in ps {
                match p {
                    ContentPart::Text { text } => {
                        parts.push(serde_json::json!({"text": text}));
                    }
                    ContentPart::ToolUse { id: _, name, input } => {
                        parts.push(serde_json::json!({
                            "functionCall": {
                                "name": name,
                                "args": input,
                            }
                        }));
                    }
                    _ => {}
                }
            }
        }
    }
    serde_json::json!({
        "role": "model",
        "parts": parts,
    })
}

fn tool_result_to_gemini(msg: &Message) -> Value {
    let part = match msg.tool_result_part() {
        Some((_, tool_name, content, _)) => serde_json::json!({
            "functionResponse": {
                "name": tool_name,
                "response": { "content": content },
            }
        }),
        None => serde_json::json!({
            "functionResponse": {
                "name": "unknown",
                "response": { "content": msg.content.extract_all_text() },
            }
        }),
    };
    serde_json::json!({
        "role": "user",
        "parts": [part],
    })
}

fn tool_to_gemini(tool: &ToolDefinition) -> Value {
    let mut decl = serde_json::json!({
        "name": tool.name,
        "description": tool.description,
    });
    // Gemini rejects an OBJECT schema with no properties.
    let has_properties = tool
        .parameters
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty());
    if has_properties {
        decl["parameters"] = sanitize_schema(&tool.parameters);
    }
    decl
}

/// Strip JSON Schema keywords the Gemini `Schema` object rejects.
pub fn sanitize_schema(schema: &Value) -> Value {
    const DROP: [&str; 5] = ["$schema", "title", "additionalProperties", "definitions", "default"];
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !DROP.contains(&k.as_str()))
                .map(|(k, v)| {
                    // Property names are user data, not keywords.
                    if k == "properties" {
                        let props = v
                            .as_object()
                            .map(|o| {
                                o.iter()
                                    .map(|(pk, pv)| (pk.clone(), sanitize_schema(pv)))
                                    .collect()
                            })
                            .unwrap_or_default();
                        (k.clone(), Value::Object(props))
                    } else {
                        (k.clone(), sanitize_schema(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_schema).collect()),
        other => other.clone(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_gemini_response(body: &Value, model: &str) -> Result<ChatResponse> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Provider {
            provider: "google".into(),
            message: "no candidates in response".into(),
        })?;

    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    let mut text_content = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    if let Some(parts) = parts {
        for part in parts {
            if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
                text_content.push_str(text);
            }
            if let Some(fc) = part.get("functionCall") {
                let tool_name = fc
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                let arguments = match fc.get("args") {
                    Some(Value::String(raw)) => parse_arguments(raw),
                    Some(v) => v.clone(),
                    None => Value::Object(Default::default()),
                };
                let call_id = format!("call_{}", uuid::Uuid::new_v4());
                tool_calls.push(ToolCall {
                    call_id,
                    tool_name,
                    arguments,
                });
            }
        }
    }

    let finish_reason = candidate
        .get("finishReason")
        .and_then(|v| v.as_str())
        .map(|s| match s {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            other => other.to_lowercase(),
        });

    let usage = body.get("usageMetadata").and_then(parse_gemini_usage);

    Ok(ChatResponse {
        content: text_content,
        tool_calls,
        usage,
        model: model.to_string(),
        finish_reason,
    })
}

fn parse_gemini_usage(v: &Value) -> Option<Usage> {
    let prompt = v.get("promptTokenCount")?.as_u64()? as u32;
    let completion = v
        .get("candidatesTokenCount")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    let total = v
        .get("totalTokenCount")
        .and_then(|v| v.as_u64())
        .unwrap_or((prompt + completion) as u64) as u32;
    Some(Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: total,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for GoogleProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let url = self.generate_url(&model);
        let body = self.build_body(req);

        tracing::debug!(provider = %self.id, url = %redact_url_key(&url), "google chat request");
        let started = Instant::now();

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let resp = error_for_status(&self.id, resp).await?;
        let resp_json: Value = resp.json().await.map_err(from_reqwest)?;
        let parsed = parse_gemini_response(&resp_json, &model)?;

        TraceEvent::LlmRequest {
            provider: self.id.clone(),
            model: model.clone(),
            with_tools: !req.tools.is_empty(),
            with_schema: req.response_schema.is_some(),
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: parsed.usage.map(|u| u.prompt_tokens),
            completion_tokens: parsed.usage.map(|u| u.completion_tokens),
        }
        .emit();

        Ok(parsed)
    }

    async fn embeddings(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.embedding_model.clone());

        // Gemini embeddings use batchEmbedContents for multiple inputs.
        let url = format!(
            "{}/v1beta/models/{}:batchEmbedContents?key={}",
            self.base_url, model, self.api_key
        );

        let requests: Vec<Value> = req
            .input
            .iter()
            .map(|text| {
                serde_json::json!({
                    "model": format!("models/{}", model),
                    "content": {
                        "parts": [{"text": text}]
                    },
                    "outputDimensionality": self.embedding_dimensions,
                })
            })
            .collect();

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "requests": requests }))
            .send()
            .await
            .map_err(from_reqwest)?;

        let resp = error_for_status(&self.id, resp).await?;
        let resp_json: Value = resp.json().await.map_err(from_reqwest)?;
        let embed_arr = resp_json
            .get("embeddings")
            .and_then(|e| e.as_array())
            .ok_or_else(|| Error::Provider {
                provider: self.id.clone(),
                message: "missing 'embeddings' array in response".into(),
            })?;

        let embeddings: Vec<Vec<f32>> = embed_arr
            .iter()
            .filter_map(|item| {
                let values = item.get("values")?.as_array()?;
                Some(
                    values
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect(),
                )
            })
            .collect();

        Ok(EmbeddingsResponse { embeddings })
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
