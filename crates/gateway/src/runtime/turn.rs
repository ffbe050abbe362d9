//! Running one turn end to end on its own task.

use cp_domain::stream::StreamPayload;
use cp_domain::tool::Message;
use cp_domain::trace::TraceEvent;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::delivery::{terminal_payload, Delivery};
use super::machine::Turn;
use crate::guardrail::GuardOutcome;
use crate::state::AppState;

/// Deciding, dispatching and synthesizing is three steps; anything past
/// this is a bug in the transition table.
const MAX_STEPS: usize = 4;

#[derive(Debug, Clone)]
pub struct TurnInput {
    pub user_id: String,
    pub thread_id: String,
    pub query: String,
}

/// Start a turn and return the stream of its payloads. The channel closes
/// after the terminal payload.
pub fn run_turn(state: AppState, input: TurnInput) -> mpsc::Receiver<StreamPayload> {
    let (tx, rx) = mpsc::channel::<StreamPayload>(32);
    let span = tracing::info_span!(
        "turn",
        thread_id = %input.thread_id,
        user_id = %input.user_id,
    );
    tokio::spawn(drive(state, input, Delivery::new(tx)).instrument(span));
    rx
}

async fn drive(state: AppState, input: TurnInput, mut out: Delivery) {
    let _slot = match state.turn_slots.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            out.finish(StreamPayload::error("server is shutting down")).await;
            return;
        }
    };
    let _thread = match state.thread_locks.acquire(&input.thread_id).await {
        Ok(permit) => permit,
        Err(e) => {
            out.finish(StreamPayload::error(e.to_string())).await;
            return;
        }
    };

    let checked = match state.guardrail.validate(&input.query).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "guardrail failed; using the query unchanged");
            GuardOutcome::accept(&input.query)
        }
    };
    if checked.bias_detected {
        tracing::info!("query rejected by guardrail");
        let payload = match checked.rejection() {
            Some(s) => StreamPayload::ValidationError {
                validator: s.validator.clone(),
                outcome: s.outcome.clone(),
                details: s.details.clone(),
            },
            None => StreamPayload::ValidationError {
                validator: "guardrail".into(),
                outcome: "fail".into(),
                details: serde_json::Value::Null,
            },
        };
        out.finish(payload).await;
        return;
    }

    let history = state.threads.history(&input.thread_id);
    let mut turn = Turn::new(input.thread_id.clone(), history, checked.validated_text);

    let mut steps = 0;
    loop {
        let before = turn.messages.len();
        let done = state.machine.step(&mut turn, &input.user_id).await;
        steps += 1;
        for msg in &turn.messages[before..] {
            out.message(msg).await;
        }
        if done {
            break;
        }
        if steps >= MAX_STEPS {
            tracing::error!(steps, state = ?turn.state(), "turn did not finish");
            let stuck = Message::error(format!("turn did not finish after {steps} steps"));
            out.message(&stuck).await;
            turn.messages.push(stuck);
            break;
        }
    }

    out.finish(terminal_payload(&turn)).await;

    TraceEvent::TurnFinished {
        thread_id: input.thread_id.clone(),
        steps,
        errored: turn.error().is_some(),
    }
    .emit();
    state
        .threads
        .record_turn(&input.thread_id, &input.user_id, &turn.messages);
}
