use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::StepwiseError;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    ContentChunk(String),
    ToolCallStart { id: String, name: String, input: String },
    ToolCallResult { id: String, output: String },
    FinalAnswer(String),
    Metadata { key: String, value: crate::Value },
}

#[async_trait]
pub trait Runnable<Input: Send + 'static, Output: Send + 'static> {
    async fn invoke(&self, input: Input) -> Result<Output, StepwiseError>;

    fn stream(&self, input: Input) -> BoxStream<'_, Result<StreamEvent, StepwiseError>>;
}
