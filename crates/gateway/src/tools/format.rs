//! Fixed text layouts the tools hand back to the model.

use std::fmt::Write;

use cp_domain::records::{EventRecord, JobRecord, NOT_AVAILABLE};
use serde_json::Value;

use crate::search::SearchHit;

pub const NO_JOBS: &str = "No jobs found for the requested filters.";
pub const NO_EVENTS: &str = "No events found for the requested filters.";
pub const NO_KNOWLEDGE: &str = "No relevant results found in the knowledge base.";

pub fn jobs(records: &[JobRecord]) -> String {
    if records.is_empty() {
        return NO_JOBS.to_string();
    }
    let mut out = String::new();
    for (i, job) in records.iter().enumerate() {
        let _ = write!(
            out,
            "Job {}:\nTitle: {}\nCompany: {}\nLocation: {}\nWork Mode: {}\nExperience: {}\nSkills: {}\n\n",
            i + 1,
            job.title,
            job.company,
            job.location,
            job.work_mode,
            job.experience,
            joined(&job.skills),
        );
    }
    out
}

pub fn events(records: &[EventRecord]) -> String {
    if records.is_empty() {
        return NO_EVENTS.to_string();
    }
    let mut out = String::new();
    for (i, e) in records.iter().enumerate() {
        let _ = write!(
            out,
            "Event {}:\nTitle: {}\nCategories: {}\nMode: {}\nDate: {}\nTime: {}\nVenue: {}\nPrice: {}\nOriginal Price: {}\nEvent URL: {}\nRegister URL: {}\n\n",
            i + 1,
            e.title,
            joined(&e.categories),
            e.mode,
            e.date,
            e.time,
            e.venue,
            e.price,
            e.original_price,
            e.event_url,
            e.register_url,
        );
    }
    out
}

/// Knowledge-base hits, read as job postings from their metadata.
pub fn hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_KNOWLEDGE.to_string();
    }
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let field = |key: &str| meta_text(hit.metadata.get(key));
        let _ = write!(
            out,
            "Result {}:\nTitle: {}\nCompany: {}\nLocation: {}\nWork Mode: {}\nExperience: {}\nSkills: {}\n",
            i + 1,
            field("title"),
            field("company"),
            field("location"),
            field("work_mode"),
            field("experience"),
            field("skills"),
        );
        if let Some(content) = &hit.content {
            let _ = writeln!(out, "Content: {content}");
        }
        out.push('\n');
    }
    out
}

fn joined(items: &[String]) -> String {
    if items.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        items.join(", ")
    }
}

fn meta_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect();
            joined(&parts)
        }
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
