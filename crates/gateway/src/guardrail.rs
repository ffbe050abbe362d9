//! Input validation run once before a turn starts.

use std::sync::Arc;

use async_trait::async_trait;
use cp_domain::records::response_schema;
use cp_domain::tool::Message;
use cp_providers::{ChatRequest, LlmProvider};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One validator's verdict on the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub validator: String,
    /// `"pass"` or `"fail"`.
    pub outcome: String,
    pub details: Value,
}

impl ValidationSummary {
    pub fn failed(&self) -> bool {
        self.outcome == "fail"
    }
}

#[derive(Debug, Clone)]
pub struct GuardOutcome {
    /// The text the turn should run on (possibly rewritten).
    pub validated_text: String,
    pub bias_detected: bool,
    pub summaries: Vec<ValidationSummary>,
}

impl GuardOutcome {
    pub fn accept(text: &str) -> Self {
        Self {
            validated_text: text.to_string(),
            bias_detected: false,
            summaries: Vec::new(),
        }
    }

    /// The summary to report when the input was rejected.
    pub fn rejection(&self) -> Option<&ValidationSummary> {
        self.summaries.iter().find(|s| s.failed())
    }
}

#[async_trait]
pub trait Guardrail: Send + Sync {
    async fn validate(&self, text: &str) -> anyhow::Result<GuardOutcome>;
}

/// Accepts everything unchanged.
pub struct PassthroughGuardrail;

#[async_trait]
impl Guardrail for PassthroughGuardrail {
    async fn validate(&self, text: &str) -> anyhow::Result<GuardOutcome> {
        Ok(GuardOutcome::accept(text))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model-backed bias detection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const BIAS_VALIDATOR: &str = "DetectBias";

const BIAS_INSTRUCTIONS: &str = "\
You review messages sent to a career assistant for women. Score how strongly \
the message expresses gender bias or stereotypes about women and work, from 0 \
(none) to 100 (overt). Questions about women's careers, returnships or \
workplace equality are not biased. Explain the score in one sentence and, \
when the score is high, suggest a neutral rewording.";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct BiasAssessment {
    /// 0 to 100.
    bias_score: u8,
    explanation: String,
    /// Neutral rewording, empty when none is needed.
    #[serde(default)]
    fixed_text: String,
}

pub struct LlmBiasGuardrail {
    llm: Arc<dyn LlmProvider>,
    threshold: u8,
}

impl LlmBiasGuardrail {
    pub fn new(llm: Arc<dyn LlmProvider>, threshold: u8) -> Self {
        Self { llm, threshold }
    }
}

#[async_trait]
impl Guardrail for LlmBiasGuardrail {
    async fn validate(&self, text: &str) -> anyhow::Result<GuardOutcome> {
        let req = ChatRequest {
            messages: vec![Message::system(BIAS_INSTRUCTIONS), Message::user(text)],
            temperature: Some(0.0),
            response_schema: Some(response_schema::<BiasAssessment>()),
            ..Default::default()
        };
        let resp = self.llm.chat(&req).await?;
        let assessment: BiasAssessment = serde_json::from_str(resp.content.trim())
            .map_err(|e| anyhow::anyhow!("bias assessment was not valid JSON: {e}"))?;

        let bias_detected = assessment.bias_score > self.threshold;
        tracing::debug!(
            score = assessment.bias_score,
            threshold = self.threshold,
            bias_detected,
            "bias check"
        );
        let summary = ValidationSummary {
            validator: BIAS_VALIDATOR.into(),
            outcome: if bias_detected { "fail" } else { "pass" }.into(),
            details: json!({
                "bias_score": assessment.bias_score,
                "explanation": assessment.explanation,
                "fixed_text": assessment.fixed_text,
            }),
        };
        Ok(GuardOutcome {
            validated_text: text.to_string(),
            bias_detected,
            summaries: vec![summary],
        })
    }
}
