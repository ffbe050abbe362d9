use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Input guardrail
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailMode {
    /// Every query is accepted unchanged.
    Passthrough,
    /// A model scores each query for gender bias.
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailConfig {
    #[serde(default = "d_mode")]
    pub mode: GuardrailMode,
    /// Scores above this (0-100) reject the query.
    #[serde(default = "d_threshold")]
    pub bias_threshold: u8,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            mode: d_mode(),
            bias_threshold: d_threshold(),
        }
    }
}

fn d_mode() -> GuardrailMode {
    GuardrailMode::Passthrough
}
fn d_threshold() -> u8 {
    70
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_passthrough() {
        let cfg: GuardrailConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.mode, GuardrailMode::Passthrough);
        assert_eq!(cfg.bias_threshold, 70);
    }

    #[test]
    fn model_mode_parses() {
        let cfg: GuardrailConfig = toml::from_str("mode = \"model\"\nbias_threshold = 50").unwrap();
        assert_eq!(cfg.mode, GuardrailMode::Model);
        assert_eq!(cfg.bias_threshold, 50);
    }
}
