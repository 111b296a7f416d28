use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Returned under every output key when the executor stops a run on budget.
pub const STOPPED_OUTPUT: &str = "Agent stopped due to iteration/time limit";

/// A parsed request to run `tool` on `tool_input`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: String,
    /// Raw model text that produced this action; replayed in the scratchpad.
    pub log: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentFinish {
    pub return_values: HashMap<String, String>,
    pub log: String,
}

impl AgentFinish {
    pub fn new(return_values: HashMap<String, String>, log: impl Into<String>) -> Self {
        Self {
            return_values,
            log: log.into(),
        }
    }

    /// A finish carrying `value` under a single key.
    pub fn single(key: impl Into<String>, value: impl Into<String>, log: impl Into<String>) -> Self {
        let mut return_values = HashMap::new();
        return_values.insert(key.into(), value.into());
        Self::new(return_values, log)
    }

    /// The fixed finish used when a run is cut off by its budget.
    pub fn stopped(output_keys: &[String]) -> Self {
        let return_values = output_keys
            .iter()
            .map(|key| (key.clone(), STOPPED_OUTPUT.to_string()))
            .collect();
        Self::new(return_values, "")
    }
}

/// What the agent decided to do next. Exactly one per iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AgentDecision {
    Action(AgentAction),
    Finish(AgentFinish),
}

/// One executed action and what the tool returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentStep {
    pub action: AgentAction,
    pub observation: String,
}
