use serde::{Deserialize, Serialize};

use crate::StepwiseError;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LlmRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            stop: Vec::new(),
        }
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LlmResponse {
    pub text: String,
}

/// Text-completion model client.
///
/// Implementations own their retry policy; a returned error is final for the
/// caller. When `request.stop` is non-empty the returned text must end before
/// the first occurrence of any stop sequence.
#[async_trait::async_trait]
pub trait Llm: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, StepwiseError>;
}

#[async_trait::async_trait]
impl<L> Llm for std::sync::Arc<L>
where
    L: Llm + ?Sized,
{
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        (**self).complete(request).await
    }
}

/// Truncates `text` at the earliest occurrence of any of `stop`.
pub fn enforce_stop_sequences(text: &str, stop: &[String]) -> String {
    let cut = stop
        .iter()
        .filter(|sequence| !sequence.is_empty())
        .filter_map(|sequence| text.find(sequence.as_str()))
        .min();
    match cut {
        Some(index) => text[..index].to_string(),
        None => text.to_string(),
    }
}
