//! `careerpath ask`: run one turn from the terminal.

use std::io::Write;
use std::sync::Arc;

use cp_domain::config::Config;
use cp_domain::stream::StreamPayload;

use crate::bootstrap;
use crate::runtime::{run_turn, TurnInput};

/// Run a single turn and print its stream. Returns `false` when the turn
/// ended in an error or the input was rejected.
pub async fn ask(
    config: Arc<Config>,
    query: String,
    user: Option<String>,
    thread: Option<String>,
    json: bool,
) -> anyhow::Result<bool> {
    if query.trim().is_empty() {
        anyhow::bail!("No message provided");
    }

    let state = bootstrap::build_app_state(config.clone()).await?;
    let thread_id = thread.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let input = TurnInput {
        user_id: user.unwrap_or_else(|| config.memory.default_user_id.clone()),
        thread_id: thread_id.clone(),
        query,
    };

    let mut rx = run_turn(state.clone(), input);
    let mut ok = true;
    let stdout = std::io::stdout();
    while let Some(payload) = rx.recv().await {
        ok &= !is_failure(&payload);
        if json {
            writeln!(stdout.lock(), "{}", payload.to_json())?;
        } else {
            print_human(&payload);
        }
    }

    state.flush_all();
    if !json {
        eprintln!("thread: {thread_id}");
    }
    Ok(ok)
}

fn is_failure(payload: &StreamPayload) -> bool {
    matches!(
        payload,
        StreamPayload::Values { error: Some(_), .. } | StreamPayload::ValidationError { .. }
    )
}

/// Answers go to stdout; tool activity and failures go to stderr.
fn print_human(payload: &StreamPayload) {
    match payload {
        StreamPayload::Message {
            function_call: true,
            function_name: Some(name),
            ..
        } => {
            eprintln!("→ calling {name}");
        }
        StreamPayload::Message {
            tool_call: true,
            tool_name,
            content,
            ..
        } => {
            let name = tool_name.as_deref().unwrap_or("tool");
            if content.starts_with("Error:") {
                eprintln!("← {name} failed: {content}");
            } else {
                eprintln!("← {name} returned {} bytes", content.len());
            }
        }
        StreamPayload::Message { .. } => {}
        StreamPayload::Values {
            final_answer: Some(answer),
            ..
        } => {
            println!("{answer}");
        }
        StreamPayload::Values { error: Some(e), .. } => {
            eprintln!("error: {e}");
        }
        StreamPayload::Values { .. } => {}
        StreamPayload::ValidationError {
            validator, details, ..
        } => {
            eprintln!("input rejected by {validator}: {details}");
        }
    }
}
