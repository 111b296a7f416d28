mod error;
mod llm;
mod retry;
mod runnable;
mod tool;

pub use error::StepwiseError;
pub use llm::{enforce_stop_sequences, Llm, LlmRequest, LlmResponse};
pub use retry::{is_retryable, Retrying};
pub use runnable::{Runnable, StreamEvent};
pub use tool::{Tool, ToolError};

pub type Value = serde_json::Value;
