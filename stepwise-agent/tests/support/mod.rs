#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stepwise_core::{Llm, LlmRequest, LlmResponse, StepwiseError, Tool, ToolError};

/// Replays canned completions in order, repeating the last one once exhausted.
pub struct ScriptedLlm {
    responses: Vec<String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: responses.into_iter().map(Into::into).collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.prompt.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);
        let text = self
            .responses
            .get(index)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_default();
        Ok(LlmResponse { text })
    }
}

pub struct FailingLlm;

#[async_trait]
impl Llm for FailingLlm {
    async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        Err(StepwiseError::LlmProvider("503: upstream unavailable".to_string()))
    }
}

/// Records every input and answers with a fixed observation.
pub struct StubTool {
    name: String,
    description: String,
    output: String,
    inputs: Mutex<Vec<String>>,
}

impl StubTool {
    pub fn new(name: &str, description: &str, output: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            description: description.to_string(),
            output: output.to_string(),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn calculator() -> Arc<Self> {
        Self::new("Calculator", "Useful for arithmetic.", "4")
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        self.inputs.lock().unwrap().push(input.to_string());
        Ok(self.output.clone())
    }
}

pub struct BrokenTool {
    pub calls: AtomicUsize,
}

impl BrokenTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "Broken"
    }

    fn description(&self) -> &str {
        "Always fails."
    }

    async fn call(&self, _input: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ToolError::ExecutionFailed("boom".to_string()))
    }
}

/// Sleeps on the tokio clock before answering.
pub struct SlowTool {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl SlowTool {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "Slow"
    }

    fn description(&self) -> &str {
        "Takes a while."
    }

    async fn call(&self, _input: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok("done".to_string())
    }
}

pub fn question(text: &str) -> HashMap<String, String> {
    HashMap::from([("input".to_string(), text.to_string())])
}

pub fn action(tool: &str, input: &str) -> String {
    format!("I should use a tool.\nAction: {tool}\nAction Input: {input}")
}
