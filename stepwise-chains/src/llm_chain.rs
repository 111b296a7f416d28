use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use stepwise_core::{Llm, LlmRequest, Runnable, StepwiseError, StreamEvent};
use stepwise_prompt::PromptTemplate;

/// Formats a prompt from named inputs and sends it to a model.
#[derive(Clone)]
pub struct LlmChain {
    prompt: PromptTemplate,
    llm: Arc<dyn Llm>,
    output_key: String,
}

impl std::fmt::Debug for LlmChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmChain")
            .field("prompt", &self.prompt)
            .field("output_key", &self.output_key)
            .finish()
    }
}

impl LlmChain {
    pub fn new(prompt: PromptTemplate, llm: Arc<dyn Llm>) -> Self {
        Self {
            prompt,
            llm,
            output_key: "text".to_string(),
        }
    }

    pub fn with_output_key(mut self, output_key: impl Into<String>) -> Self {
        self.output_key = output_key.into();
        self
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    pub fn llm(&self) -> Arc<dyn Llm> {
        Arc::clone(&self.llm)
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    pub fn input_keys(&self) -> Vec<String> {
        self.prompt.input_variables()
    }

    /// Formats the prompt and returns the raw completion text.
    pub async fn predict(
        &self,
        vars: &HashMap<String, String>,
        stop: &[String],
    ) -> Result<String, StepwiseError> {
        let prompt = self.prompt.format(vars)?;
        let response = self
            .llm
            .complete(LlmRequest::new(prompt).with_stop(stop.to_vec()))
            .await?;
        Ok(response.text)
    }

    pub async fn call(
        &self,
        inputs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>, StepwiseError> {
        let text = self.predict(inputs, &[]).await?;
        let mut outputs = HashMap::new();
        outputs.insert(self.output_key.clone(), text);
        Ok(outputs)
    }
}

#[async_trait::async_trait]
impl Runnable<HashMap<String, String>, HashMap<String, String>> for LlmChain {
    async fn invoke(
        &self,
        input: HashMap<String, String>,
    ) -> Result<HashMap<String, String>, StepwiseError> {
        self.call(&input).await
    }

    fn stream(
        &self,
        input: HashMap<String, String>,
    ) -> BoxStream<'_, Result<StreamEvent, StepwiseError>> {
        stream::once(async move {
            let text = self.predict(&input, &[]).await?;
            Ok(StreamEvent::FinalAnswer(text))
        })
        .boxed()
    }
}
