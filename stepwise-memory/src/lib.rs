use async_trait::async_trait;
use std::collections::HashMap;
use stepwise_core::StepwiseError;

pub mod buffer;

pub use buffer::ConversationBufferMemory;

#[async_trait]
pub trait Memory: Send + Sync {
    /// Names of the variables `load_memory_variables` contributes to a prompt
    fn memory_variables(&self) -> Vec<String>;

    /// Return key-value pairs of memory variables (e.g., chat history)
    async fn load_memory_variables(
        &self,
        thread_id: &str,
    ) -> Result<HashMap<String, String>, StepwiseError>;

    /// Save context from this interaction to memory
    async fn save_context(
        &self,
        thread_id: &str,
        inputs: &HashMap<String, String>,
        outputs: &HashMap<String, String>,
    ) -> Result<(), StepwiseError>;

    /// Clear memory for the given thread
    async fn clear(&self, thread_id: &str) -> Result<(), StepwiseError>;
}
