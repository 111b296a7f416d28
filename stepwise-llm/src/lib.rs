// OpenAI-compatible client (always available)
pub mod openai_compatible;

pub use openai_compatible::{
    CompletionRequest, OpenAiCompletionBuilder, OpenAiCompletionClient, DEFAULT_BASE_URL,
    DEFAULT_MODEL,
};
pub use stepwise_core::{Llm, LlmRequest, LlmResponse};
