//! System prompts for the deciding and synthesizing steps.

use std::fmt::Write;

use cp_domain::profile::UserProfile;
use cp_domain::tool::ToolDefinition;

use crate::tools::ToolKind;

const PERSONA: &str = "\
You are Asha, the career assistant of the HerKey platform, helping women \
start, grow and restart their careers. You help with job listings, \
community events, mentorship, learning paths and professional networking.

Guidelines:
- Keep track of the whole conversation and answer follow-ups in context.
- Prefer a tool over memory whenever the user needs live or verified facts.
- Use inclusive, respectful language. If a question carries a gender \
stereotype, gently reframe it before answering.
- Stay within careers, jobs, events, mentorship and networking; steer \
other topics back politely.
- Never ask for sensitive personal data.
Tone: professional, warm and encouraging.";

/// Prompt for the step that decides whether to call a tool.
pub fn deciding(tools: &[ToolDefinition], profile: Option<&UserProfile>) -> String {
    let mut prompt = String::from(PERSONA);
    if !tools.is_empty() {
        prompt.push_str("\n\nTools you can call:\n");
        for tool in tools {
            let _ = writeln!(prompt, "- `{}`: {}", tool.name, tool.description);
        }
        prompt.push_str(
            "Call at most one tool. Answer directly when no tool is needed, for \
             greetings and for questions you can answer from the conversation.",
        );
    }
    append_profile(&mut prompt, profile);
    prompt
}

/// Prompt for the step that turns a tool result into the answer.
pub fn synthesizing(tool: Option<ToolKind>, profile: Option<&UserProfile>) -> String {
    let mut prompt = String::from(PERSONA);
    prompt.push_str("\n\n");
    prompt.push_str(match tool {
        Some(ToolKind::JobLookup) => {
            "Answer with the jobs from the tool result that fit the user's request. \
             Copy title, company, location, work mode and experience exactly as \
             listed; give skills as one comma separated string. Use N/A for \
             anything missing and never invent a job."
        }
        Some(ToolKind::EventLookup) => {
            "Answer with the events from the tool result that fit the user's request, \
             copying every field and link exactly as listed. Use N/A for anything \
             missing and never invent an event."
        }
        Some(ToolKind::CareerGuidance) => {
            "Using the search results, state the user's career goal and lay out a \
             staged learning path to reach it, each stage with concrete topics."
        }
        Some(ToolKind::ProfileUpdate) => {
            "Briefly confirm to the user what was remembered, then continue the \
             conversation."
        }
        Some(ToolKind::KnowledgeBase) | None => {
            "Answer the user's question from the tool result. Say so plainly if the \
             result does not contain the answer."
        }
    });
    append_profile(&mut prompt, profile);
    prompt
}

/// Known facts about the user, offered as context only.
fn append_profile(prompt: &mut String, profile: Option<&UserProfile>) {
    let Some(profile) = profile.filter(|p| !p.is_empty()) else {
        return;
    };
    prompt.push_str(
        "\n\nWhat we remember about this user (context only; it may be outdated, \
         and the user's current messages take precedence):\n",
    );
    prompt.push_str(&profile.to_prompt_block());
}
