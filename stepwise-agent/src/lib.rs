//! The reasoning loop: parse model output into actions, run tools, replay the
//! transcript, and stop on a final answer or an exhausted budget.

mod action;
mod agent;
mod config;
mod executor;
mod initialize;
mod load;
mod output_parser;
mod scratchpad;
mod tools;
mod zero_shot;

pub use action::{AgentAction, AgentDecision, AgentFinish, AgentStep, STOPPED_OUTPUT};
pub use agent::Agent;
pub use config::{ExecutorConfig, ParseErrorPolicy, RunOptions, StoppingMethod};
pub use executor::{AgentExecutor, AgentExecutorBuilder, ExecutorOutput, INVALID_RESPONSE_OBSERVATION};
pub use initialize::{initialize_agent_executor, AgentType};
pub use load::{load_agent, load_agent_from_file, save_agent};
pub use output_parser::{OutputParser, ReActOutputParser, FINAL_ANSWER_MARKER};
pub use scratchpad::ScratchpadFormat;
pub use tools::{ToolRegistry, EXCEPTION_TOOL, NO_SUCH_TOOL};
pub use zero_shot::{
    PromptArgs, SerializedAgent, SerializedZeroShotAgent, ZeroShotAgent,
    DEFAULT_FORMAT_INSTRUCTIONS, DEFAULT_PREFIX, DEFAULT_SUFFIX, OBSERVATION_STOP, SCRATCHPAD_KEY,
};

pub use tokio_util::sync::CancellationToken;
