//! Core runtime: the conversation state machine and the task that drives
//! it for one turn, streaming every appended message to the caller.

pub mod delivery;
pub mod machine;
pub mod prompts;
pub mod turn;

pub use delivery::{payload_for, Delivery};
pub use machine::{next_state, AnswerShape, ConversationMachine, MachineOptions, Turn, TurnState};
pub use turn::{run_turn, TurnInput};
