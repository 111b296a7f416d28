use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepwiseError {
    #[error("LLM provider failed: {0}")]
    LlmProvider(String),
    #[error("Parsing failed on output '{output}': {reason}")]
    ParseFailed { output: String, reason: String },
    #[error("Missing value for prompt variable '{0}'")]
    MissingPromptVariable(String),
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Max retries ({max}) exceeded: {last_error}")]
    MaxRetriesExceeded { max: usize, last_error: String },
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}
