use crate::Memory;
use async_trait::async_trait;
use std::collections::HashMap;
use stepwise_core::StepwiseError;
use tokio::sync::RwLock;

/// Keeps the whole conversation of each thread as a single text buffer of
/// `Human: ...` / `AI: ...` lines.
pub struct ConversationBufferMemory {
    human_prefix: String,
    ai_prefix: String,
    memory_key: String,
    input_key: Option<String>,
    output_key: Option<String>,
    buffers: RwLock<HashMap<String, String>>,
}

impl Default for ConversationBufferMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationBufferMemory {
    pub fn new() -> Self {
        Self {
            human_prefix: "Human".to_string(),
            ai_prefix: "AI".to_string(),
            memory_key: "history".to_string(),
            input_key: None,
            output_key: None,
            buffers: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_prefixes(
        mut self,
        human_prefix: impl Into<String>,
        ai_prefix: impl Into<String>,
    ) -> Self {
        self.human_prefix = human_prefix.into();
        self.ai_prefix = ai_prefix.into();
        self
    }

    pub fn with_memory_key(mut self, memory_key: impl Into<String>) -> Self {
        self.memory_key = memory_key.into();
        self
    }

    pub fn with_input_key(mut self, input_key: impl Into<String>) -> Self {
        self.input_key = Some(input_key.into());
        self
    }

    pub fn with_output_key(mut self, output_key: impl Into<String>) -> Self {
        self.output_key = Some(output_key.into());
        self
    }

    pub async fn buffer(&self, thread_id: &str) -> String {
        self.buffers
            .read()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn resolve_input_key(&self, inputs: &HashMap<String, String>) -> Result<String, StepwiseError> {
        if let Some(key) = &self.input_key {
            return Ok(key.clone());
        }
        prompt_input_key(inputs, &self.memory_variables())
    }

    fn resolve_output_key(&self, outputs: &HashMap<String, String>) -> Result<String, StepwiseError> {
        if let Some(key) = &self.output_key {
            return Ok(key.clone());
        }
        let mut keys: Vec<&String> = outputs.keys().collect();
        if keys.len() != 1 {
            keys.sort();
            return Err(StepwiseError::InvalidConfig(format!(
                "one output key expected, got {keys:?}"
            )));
        }
        Ok(keys[0].clone())
    }
}

/// Picks the single input that is neither a memory variable nor `stop`.
pub(crate) fn prompt_input_key(
    inputs: &HashMap<String, String>,
    memory_variables: &[String],
) -> Result<String, StepwiseError> {
    let mut candidates: Vec<&String> = inputs
        .keys()
        .filter(|key| key.as_str() != "stop" && !memory_variables.contains(key))
        .collect();
    if candidates.len() != 1 {
        candidates.sort();
        return Err(StepwiseError::InvalidConfig(format!(
            "one input key expected, got {candidates:?}"
        )));
    }
    Ok(candidates[0].clone())
}

#[async_trait]
impl Memory for ConversationBufferMemory {
    fn memory_variables(&self) -> Vec<String> {
        vec![self.memory_key.clone()]
    }

    async fn load_memory_variables(
        &self,
        thread_id: &str,
    ) -> Result<HashMap<String, String>, StepwiseError> {
        let mut vars = HashMap::new();
        vars.insert(self.memory_key.clone(), self.buffer(thread_id).await);
        Ok(vars)
    }

    async fn save_context(
        &self,
        thread_id: &str,
        inputs: &HashMap<String, String>,
        outputs: &HashMap<String, String>,
    ) -> Result<(), StepwiseError> {
        let input_key = self.resolve_input_key(inputs)?;
        let output_key = self.resolve_output_key(outputs)?;
        let human = inputs.get(&input_key).map(String::as_str).unwrap_or("");
        let ai = outputs.get(&output_key).map(String::as_str).unwrap_or("");

        let mut buffers = self.buffers.write().await;
        let buffer = buffers.entry(thread_id.to_string()).or_default();
        buffer.push('\n');
        buffer.push_str(&format!("{}: {human}\n{}: {ai}", self.human_prefix, self.ai_prefix));
        Ok(())
    }

    async fn clear(&self, thread_id: &str) -> Result<(), StepwiseError> {
        self.buffers.write().await.remove(thread_id);
        Ok(())
    }
}
