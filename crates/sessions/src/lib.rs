//! Conversation threads for careerpath.
//!
//! Every request names a `thread_id`; the messages of earlier turns in that
//! thread are replayed ahead of the new turn so follow-up questions keep
//! their context.

pub mod store;

pub use store::{ThreadEntry, ThreadStore};
