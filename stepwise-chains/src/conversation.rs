use std::collections::HashMap;
use std::sync::Arc;

use stepwise_core::{Llm, StepwiseError};
use stepwise_memory::{ConversationBufferMemory, Memory};
use stepwise_prompt::PromptTemplate;

pub const DEFAULT_CONVERSATION_TEMPLATE: &str = "The following is a friendly conversation between a human and an AI. The AI is talkative and provides lots of specific details from its context. If the AI does not know the answer to a question, it truthfully says it does not know.

Current conversation:
{{history}}
Human: {{input}}
AI:";

/// An [`LlmChain`](crate::LlmChain) whose prompt is fed the running
/// transcript of a thread and which records each exchange back into memory.
pub struct ConversationChain {
    chain: crate::LlmChain,
    memory: Arc<dyn Memory>,
}

impl ConversationChain {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            chain: crate::LlmChain::new(PromptTemplate::new(DEFAULT_CONVERSATION_TEMPLATE), llm)
                .with_output_key("response"),
            memory: Arc::new(ConversationBufferMemory::new()),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        let output_key = self.chain.output_key().to_string();
        let llm = self.chain.llm();
        self.chain = crate::LlmChain::new(prompt, llm).with_output_key(output_key);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_output_key(mut self, output_key: impl Into<String>) -> Self {
        self.chain = self.chain.with_output_key(output_key);
        self
    }

    pub fn memory(&self) -> &Arc<dyn Memory> {
        &self.memory
    }

    /// Checks that the prompt consumes every memory variable plus exactly one
    /// caller-provided input.
    pub fn validate(&self) -> Result<(), StepwiseError> {
        let memory_keys = self.memory.memory_variables();
        let prompt_keys = self.chain.input_keys();
        if let Some(missing) = memory_keys.iter().find(|key| !prompt_keys.contains(key)) {
            return Err(StepwiseError::InvalidConfig(format!(
                "prompt does not use memory variable '{missing}'"
            )));
        }
        let inputs = prompt_keys
            .iter()
            .filter(|key| !memory_keys.contains(key))
            .count();
        if inputs != 1 {
            return Err(StepwiseError::InvalidConfig(format!(
                "conversation prompt must take exactly one input besides memory, got {inputs}"
            )));
        }
        Ok(())
    }

    pub async fn call(
        &self,
        thread_id: &str,
        inputs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>, StepwiseError> {
        let mut vars = self.memory.load_memory_variables(thread_id).await?;
        vars.extend(inputs.iter().map(|(k, v)| (k.clone(), v.clone())));

        let outputs = self.chain.call(&vars).await?;
        self.memory.save_context(thread_id, inputs, &outputs).await?;
        tracing::debug!(thread_id, "conversation turn recorded");
        Ok(outputs)
    }

    pub async fn predict(&self, thread_id: &str, input: &str) -> Result<String, StepwiseError> {
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), input.to_string());
        let mut outputs = self.call(thread_id, &inputs).await?;
        outputs
            .remove(self.chain.output_key())
            .ok_or_else(|| StepwiseError::Custom("conversation produced no output".to_string()))
    }
}
