//! careerpath gateway: the conversation runtime, its tools, and the HTTP
//! and CLI surfaces that drive it.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod guardrail;
pub mod runtime;
pub mod search;
pub mod state;
pub mod tools;
