//! Umbrella crate for the stepwise workspace.
//!
//! Each component crate is re-exported under its own module and enabled by
//! the cargo feature of the same name. [`prelude`] pulls in the types most
//! programs need to run an agent.

pub use stepwise_core as core;
pub use stepwise_prompt as prompt;

#[cfg(feature = "openai")]
pub use stepwise_llm as llm;

#[cfg(feature = "memory")]
pub use stepwise_memory as memory;

#[cfg(feature = "chains")]
pub use stepwise_chains as chains;

#[cfg(feature = "agent")]
pub use stepwise_agent as agent;

pub use stepwise_core::{StepwiseError, Tool, ToolError};

pub mod prelude {
    pub use stepwise_core::{
        Llm, LlmRequest, LlmResponse, Retrying, Runnable, StepwiseError, StreamEvent, Tool,
        ToolError,
    };
    pub use stepwise_prompt::PromptTemplate;

    #[cfg(feature = "openai")]
    pub use stepwise_llm::OpenAiCompletionClient;

    #[cfg(feature = "memory")]
    pub use stepwise_memory::{ConversationBufferMemory, Memory};

    #[cfg(feature = "chains")]
    pub use stepwise_chains::{ConversationChain, LlmChain};

    #[cfg(feature = "agent")]
    pub use stepwise_agent::{
        initialize_agent_executor, AgentExecutor, AgentType, CancellationToken, ExecutorOutput,
        RunOptions, StoppingMethod, ZeroShotAgent,
    };
}
