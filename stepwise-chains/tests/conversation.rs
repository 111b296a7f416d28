use std::sync::{Arc, Mutex};

use stepwise_chains::ConversationChain;
use stepwise_core::{Llm, LlmRequest, LlmResponse, StepwiseError};
use stepwise_memory::ConversationBufferMemory;
use stepwise_prompt::PromptTemplate;

struct ScriptedLlm {
    replies: Mutex<Vec<&'static str>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<&'static str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Llm for ScriptedLlm {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| StepwiseError::LlmProvider("script exhausted".to_string()))?;
        Ok(LlmResponse {
            text: text.to_string(),
        })
    }
}

#[tokio::test]
async fn conversation_feeds_history_into_next_prompt() {
    let llm = Arc::new(ScriptedLlm::new(vec![" Hello! I'm an AI.", " You said hi."]));
    let chain = ConversationChain::new(llm.clone());
    chain.validate().unwrap();

    let first = chain.predict("thread-a", "Hi").await.unwrap();
    let second = chain.predict("thread-a", "What did I say?").await.unwrap();

    assert_eq!(first, " Hello! I'm an AI.");
    assert_eq!(second, " You said hi.");

    let prompts = llm.prompts.lock().unwrap();
    assert!(prompts[0].ends_with("Current conversation:\n\nHuman: Hi\nAI:"));
    assert!(prompts[1].contains("\nHuman: Hi\nAI:  Hello! I'm an AI.\nHuman: What did I say?\nAI:"));
}

#[tokio::test]
async fn threads_do_not_share_history() {
    let llm = Arc::new(ScriptedLlm::new(vec!["one", "two"]));
    let memory = Arc::new(ConversationBufferMemory::new());
    let chain = ConversationChain::new(llm.clone()).with_memory(memory.clone());

    chain.predict("a", "first").await.unwrap();
    chain.predict("b", "second").await.unwrap();

    assert_eq!(memory.buffer("a").await, "\nHuman: first\nAI: one");
    assert_eq!(memory.buffer("b").await, "\nHuman: second\nAI: two");
}

#[tokio::test]
async fn model_failure_leaves_memory_untouched() {
    let llm = Arc::new(ScriptedLlm::new(vec![]));
    let memory = Arc::new(ConversationBufferMemory::new());
    let chain = ConversationChain::new(llm).with_memory(memory.clone());

    let error = chain.predict("a", "hello").await.unwrap_err();

    assert!(matches!(error, StepwiseError::LlmProvider(_)));
    assert_eq!(memory.buffer("a").await, "");
}

#[test]
fn validate_rejects_prompt_without_history() {
    let llm = Arc::new(ScriptedLlm::new(vec![]));
    let chain =
        ConversationChain::new(llm).with_prompt(PromptTemplate::new("Human: {{input}}\nAI:"));
    assert!(matches!(chain.validate(), Err(StepwiseError::InvalidConfig(_))));
}
