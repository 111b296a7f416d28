use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use stepwise_chains::LlmChain;
use stepwise_core::{Llm, LlmRequest, LlmResponse, Runnable, StepwiseError, StreamEvent};
use stepwise_prompt::PromptTemplate;

#[derive(Default)]
struct RecordingLlm {
    requests: Mutex<Vec<LlmRequest>>,
}

#[async_trait::async_trait]
impl Llm for RecordingLlm {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        let text = format!("echo: {}", request.prompt);
        self.requests.lock().unwrap().push(request);
        Ok(LlmResponse { text })
    }
}

fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn call_formats_prompt_and_returns_output_key() {
    let llm = Arc::new(RecordingLlm::default());
    let chain = LlmChain::new(PromptTemplate::new("Tell me about {{topic}}."), llm.clone());

    let outputs = chain.call(&inputs(&[("topic", "rust")])).await.unwrap();

    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs["text"], "echo: Tell me about rust.");
    let requests = llm.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].stop.is_empty());
}

#[tokio::test]
async fn predict_forwards_stop_sequences() {
    let llm = Arc::new(RecordingLlm::default());
    let chain = LlmChain::new(PromptTemplate::new("{{q}}"), llm.clone());

    chain
        .predict(&inputs(&[("q", "hi")]), &["\nObservation:".to_string()])
        .await
        .unwrap();

    let requests = llm.requests.lock().unwrap();
    assert_eq!(requests[0].stop, vec!["\nObservation:".to_string()]);
}

#[tokio::test]
async fn missing_variable_fails_before_calling_model() {
    let llm = Arc::new(RecordingLlm::default());
    let chain = LlmChain::new(PromptTemplate::new("{{a}} {{b}}"), llm.clone())
        .with_output_key("answer");
    assert_eq!(chain.input_keys(), vec!["a", "b"]);

    let error = chain.call(&inputs(&[("a", "1")])).await.unwrap_err();

    assert!(matches!(error, StepwiseError::MissingPromptVariable(ref name) if name == "b"));
    assert!(llm.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn runnable_stream_yields_final_answer() {
    let llm = Arc::new(RecordingLlm::default());
    let chain = LlmChain::new(PromptTemplate::new("{{q}}"), llm);

    let events: Vec<_> = chain.stream(inputs(&[("q", "ping")])).collect().await;

    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].as_ref().unwrap(),
        &StreamEvent::FinalAnswer("echo: ping".to_string())
    );

    let outputs = chain.invoke(inputs(&[("q", "pong")])).await.unwrap();
    assert_eq!(outputs["text"], "echo: pong");
}
