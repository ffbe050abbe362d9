use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Long-lived facts about one user, gathered across conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_name: Option<String>,
    /// How the user likes answers phrased, e.g. "short bullet points".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_style_preference: Option<String>,
    #[serde(default)]
    pub special_skills: Vec<String>,
    #[serde(default)]
    pub other_preferences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_work_mode: Option<String>,
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        *self == UserProfile::default()
    }

    /// Fold `incoming` into `self`.
    ///
    /// Lists are extended with entries not already present (case-insensitive).
    /// A scalar is taken from `incoming` only when it is non-blank, so a merge
    /// never clears a known fact. Returns true if anything changed.
    pub fn merge(&mut self, incoming: &UserProfile) -> bool {
        let before = self.clone();

        merge_scalar(&mut self.name, &incoming.name);
        merge_scalar(&mut self.preferred_name, &incoming.preferred_name);
        merge_scalar(
            &mut self.response_style_preference,
            &incoming.response_style_preference,
        );
        merge_scalar(&mut self.preferred_work_mode, &incoming.preferred_work_mode);
        merge_list(&mut self.special_skills, &incoming.special_skills);
        merge_list(&mut self.other_preferences, &incoming.other_preferences);

        *self != before
    }

    /// Render the profile as the block appended to the system prompt.
    pub fn to_prompt_block(&self) -> String {
        let mut lines = Vec::new();
        let scalars = [
            ("Name", &self.name),
            ("Preferred name", &self.preferred_name),
            ("Response style", &self.response_style_preference),
            ("Preferred work mode", &self.preferred_work_mode),
        ];
        for (label, value) in scalars {
            if let Some(v) = value {
                lines.push(format!("- {label}: {v}"));
            }
        }
        if !self.special_skills.is_empty() {
            lines.push(format!("- Skills: {}", self.special_skills.join(", ")));
        }
        if !self.other_preferences.is_empty() {
            lines.push(format!("- Other preferences: {}", self.other_preferences.join(", ")));
        }
        format!("<User Profile>\n{}\n</User Profile>", lines.join("\n"))
    }
}

fn merge_scalar(current: &mut Option<String>, incoming: &Option<String>) {
    if let Some(v) = incoming.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        *current = Some(v.to_string());
    }
}

fn merge_list(current: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if !current.iter().any(|c| c.eq_ignore_ascii_case(item)) {
            current.push(item.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_extends_lists_without_duplicates() {
        let mut p = UserProfile {
            special_skills: vec!["Python".into()],
            ..Default::default()
        };
        let changed = p.merge(&UserProfile {
            special_skills: vec!["python".into(), "SQL".into()],
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(p.special_skills, vec!["Python", "SQL"]);
    }

    #[test]
    fn merge_never_blanks_known_facts() {
        let mut p = UserProfile {
            name: Some("Asha".into()),
            preferred_work_mode: Some("remote".into()),
            ..Default::default()
        };
        let changed = p.merge(&UserProfile {
            name: Some("   ".into()),
            preferred_work_mode: None,
            ..Default::default()
        });
        assert!(!changed);
        assert_eq!(p.name.as_deref(), Some("Asha"));
        assert_eq!(p.preferred_work_mode.as_deref(), Some("remote"));
    }

    #[test]
    fn merge_of_nothing_new_reports_unchanged() {
        let mut p = UserProfile {
            other_preferences: vec!["mentorship".into()],
            ..Default::default()
        };
        let snapshot = p.clone();
        assert!(!p.merge(&snapshot));
        assert_eq!(p, snapshot);
    }

    #[test]
    fn prompt_block_lists_known_fields() {
        let p = UserProfile {
            preferred_name: Some("Sam".into()),
            special_skills: vec!["Rust".into(), "Go".into()],
            ..Default::default()
        };
        let block = p.to_prompt_block();
        assert!(block.starts_with("<User Profile>"));
        assert!(block.contains("- Preferred name: Sam"));
        assert!(block.contains("- Skills: Rust, Go"));
        assert!(block.ends_with("</User Profile>"));
    }
}
