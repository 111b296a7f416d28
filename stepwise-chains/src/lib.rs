mod conversation;
mod llm_chain;

pub use conversation::{ConversationChain, DEFAULT_CONVERSATION_TEMPLATE};
pub use llm_chain::LlmChain;
