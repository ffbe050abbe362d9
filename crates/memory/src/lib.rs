//! Per-user profile memory: a merge-only JSON store plus the model-backed
//! extractor that turns a conversation into profile facts.

pub mod extractor;
pub mod store;
pub mod transcript;
pub mod updater;

pub use extractor::{LlmMemoryExtractor, MemoryExtractor};
pub use store::{profile_namespace, ProfileStore};
pub use updater::{ProfileUpdate, ProfileUpdater};
