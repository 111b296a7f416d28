use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stepwise_core::{Llm, StepwiseError, Tool};

use crate::executor::AgentExecutor;
use crate::tools::ToolRegistry;
use crate::zero_shot::{PromptArgs, ZeroShotAgent};

/// Agent strategies that can be built by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentType {
    #[default]
    ZeroShotReactDescription,
}

impl std::str::FromStr for AgentType {
    type Err = StepwiseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "zero-shot-react-description" => Ok(Self::ZeroShotReactDescription),
            other => Err(StepwiseError::InvalidConfig(format!(
                "unknown agent type: {other}"
            ))),
        }
    }
}

/// Builds an executor over `tools` with the default prompt for `agent_type`.
pub fn initialize_agent_executor(
    tools: Vec<Arc<dyn Tool>>,
    llm: Arc<dyn Llm>,
    agent_type: AgentType,
) -> Result<AgentExecutor<ZeroShotAgent>, StepwiseError> {
    match agent_type {
        AgentType::ZeroShotReactDescription => {
            let agent = ZeroShotAgent::from_llm_and_tools(llm, &tools, PromptArgs::default())?;
            let registry = ToolRegistry::from_tools(tools)?;
            Ok(AgentExecutor::new(agent, registry))
        }
    }
}
