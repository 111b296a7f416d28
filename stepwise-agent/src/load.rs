use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use stepwise_core::{Llm, StepwiseError, Tool};

use crate::initialize::AgentType;
use crate::zero_shot::{SerializedAgent, ZeroShotAgent};

/// Rebuilds a saved agent from its JSON form.
pub fn load_agent(
    data: Value,
    llm: Arc<dyn Llm>,
    tools: &[Arc<dyn Tool>],
) -> Result<ZeroShotAgent, StepwiseError> {
    let kind = data
        .get("_type")
        .and_then(Value::as_str)
        .ok_or_else(|| StepwiseError::InvalidConfig("saved agent has no `_type`".to_string()))?;
    match kind.parse::<AgentType>()? {
        AgentType::ZeroShotReactDescription => {
            let SerializedAgent::ZeroShotReactDescription(saved) = serde_json::from_value(data)?;
            ZeroShotAgent::deserialize(saved, llm, tools)
        }
    }
}

/// Reads a saved agent from a JSON file.
pub fn load_agent_from_file(
    path: impl AsRef<Path>,
    llm: Arc<dyn Llm>,
    tools: &[Arc<dyn Tool>],
) -> Result<ZeroShotAgent, StepwiseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|err| {
        StepwiseError::InvalidConfig(format!("failed to read {}: {err}", path.display()))
    })?;
    load_agent(serde_json::from_str(&content)?, llm, tools)
}

/// Writes `agent` as pretty JSON.
pub fn save_agent(path: impl AsRef<Path>, agent: &ZeroShotAgent) -> Result<(), StepwiseError> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(&agent.serialize())?;
    fs::write(path, content).map_err(|err| {
        StepwiseError::Custom(format!("failed to write {}: {err}", path.display()))
    })
}
