pub mod google;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use google::GoogleProvider;
pub use traits::{
    ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider, Usage,
};
