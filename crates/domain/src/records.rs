//! Listing records scraped from the job board, and the structured answer
//! shapes the model is asked to produce from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for any field the page did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

pub fn is_available(value: &str) -> bool {
    !value.is_empty() && value != NOT_AVAILABLE
}

fn na() -> String {
    NOT_AVAILABLE.to_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scraped records
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default = "na")]
    pub title: String,
    #[serde(default = "na")]
    pub company: String,
    #[serde(default = "na")]
    pub location: String,
    #[serde(default = "na")]
    pub work_mode: String,
    #[serde(default = "na")]
    pub experience: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "na")]
    pub source: String,
    #[serde(default = "na")]
    pub url: String,
    #[serde(default = "na")]
    pub description: String,
}

impl Default for JobRecord {
    fn default() -> Self {
        Self {
            title: na(),
            company: na(),
            location: na(),
            work_mode: na(),
            experience: na(),
            skills: Vec::new(),
            source: na(),
            url: na(),
            description: na(),
        }
    }
}

impl JobRecord {
    /// A job is kept when its title was found. A missing company is
    /// tolerated and left as the sentinel.
    pub fn is_acceptable(&self) -> bool {
        is_available(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default = "na")]
    pub id: String,
    #[serde(default = "na")]
    pub title: String,
    #[serde(default = "na")]
    pub image_url: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "na")]
    pub mode: String,
    #[serde(default = "na")]
    pub date: String,
    #[serde(default = "na")]
    pub time: String,
    #[serde(default = "na")]
    pub venue: String,
    #[serde(default = "na")]
    pub price: String,
    #[serde(default = "na")]
    pub original_price: String,
    #[serde(default = "na")]
    pub event_url: String,
    #[serde(default = "na")]
    pub register_url: String,
    #[serde(default = "na")]
    pub interested_url: String,
}

impl Default for EventRecord {
    fn default() -> Self {
        Self {
            id: na(),
            title: na(),
            image_url: na(),
            categories: Vec::new(),
            mode: na(),
            date: na(),
            time: na(),
            venue: na(),
            price: na(),
            original_price: na(),
            event_url: na(),
            register_url: na(),
            interested_url: na(),
        }
    }
}

impl EventRecord {
    /// An event needs both a title and an id.
    pub fn is_acceptable(&self) -> bool {
        is_available(&self.title) && is_available(&self.id)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Structured answers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One job in a structured answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobResponse {
    pub title: String,
    pub company: String,
    pub location: String,
    pub work_mode: String,
    pub experience: String,
    /// Comma separated skill list.
    pub skills: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobResponseList {
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventResponse {
    pub title: String,
    pub image_url: String,
    pub categories: Vec<String>,
    pub mode: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub price: String,
    pub event_url: String,
    pub register_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventResponseList {
    pub events: Vec<EventResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LearningStage {
    /// Stage label, e.g. "Foundations".
    pub stage: String,
    pub topics: Vec<String>,
}

/// A career goal plus the staged path to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CareerResponse {
    pub goal: String,
    pub learning_path: Vec<LearningStage>,
}

/// JSON schema for `T` with every subschema inlined and no `$schema` key.
pub fn response_schema<T: JsonSchema>() -> Value {
    let generator = schemars::gen::SchemaSettings::openapi3()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator();
    let root = generator.into_root_schema_for::<T>();
    let mut value = serde_json::to_value(root).unwrap_or(Value::Null);
    if let Some(obj) = value.as_object_mut() {
        obj.remove("definitions");
        obj.remove("components");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_sentinel() {
        let job = JobRecord::default();
        assert_eq!(job.company, NOT_AVAILABLE);
        assert!(job.skills.is_empty());
        assert!(!job.is_acceptable());

        let event = EventRecord::default();
        assert_eq!(event.venue, NOT_AVAILABLE);
        assert!(!event.is_acceptable());
    }

    #[test]
    fn missing_fields_deserialize_to_sentinel() {
        let job: JobRecord = serde_json::from_str(r#"{"title":"Analyst"}"#).unwrap();
        assert_eq!(job.location, NOT_AVAILABLE);
        assert_eq!(job.company, NOT_AVAILABLE);
        assert!(job.is_acceptable());

        let event: EventRecord = serde_json::from_str(r#"{"title":"Meetup"}"#).unwrap();
        assert!(!event.is_acceptable());
    }

    #[test]
    fn job_list_schema_is_inlined() {
        let schema = response_schema::<JobResponseList>();
        let text = schema.to_string();
        assert!(!text.contains("$ref"));
        assert!(!text.contains("$schema"));
        assert_eq!(schema["properties"]["jobs"]["type"], "array");
        assert_eq!(schema["properties"]["jobs"]["items"]["properties"]["title"]["type"], "string");
    }

    #[test]
    fn career_schema_nests_learning_stages() {
        let schema = response_schema::<CareerResponse>();
        let stage = &schema["properties"]["learning_path"]["items"];
        assert_eq!(stage["properties"]["topics"]["type"], "array");
    }
}
