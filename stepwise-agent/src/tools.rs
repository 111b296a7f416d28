use std::collections::HashMap;
use std::sync::Arc;

use stepwise_core::{StepwiseError, Tool};

use crate::action::AgentAction;

/// Reserved tool name recorded for model output that could not be parsed
/// when the executor is configured to observe parse errors.
pub const EXCEPTION_TOOL: &str = "_Exception";

/// Prefix of the observation returned for a tool name that is not registered.
pub const NO_SUCH_TOOL: &str = "no such tool";

/// Named set of tools the agent may call, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
    early_stop_tool: Option<String>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("early_stop_tool", &self.early_stop_tool)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Result<Self, StepwiseError> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), StepwiseError> {
        let name = tool.name().to_string();
        if name.trim().is_empty() {
            return Err(StepwiseError::InvalidConfig(format!(
                "tool name must not be empty or whitespace: {name:?}"
            )));
        }
        if self.is_reserved(&name) {
            return Err(StepwiseError::InvalidConfig(format!(
                "tool name is reserved: {name}"
            )));
        }
        if self.index.contains_key(&name) {
            return Err(StepwiseError::InvalidConfig(format!(
                "duplicate tool name: {name}"
            )));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Declares `name` as the tool an agent emits to end the run; its input
    /// becomes the final answer. It must not collide with a registered tool.
    pub fn with_early_stop_tool(mut self, name: impl Into<String>) -> Result<Self, StepwiseError> {
        let name = name.into();
        if self.index.contains_key(&name) || name == EXCEPTION_TOOL {
            return Err(StepwiseError::InvalidConfig(format!(
                "early stop tool collides with an existing tool: {name}"
            )));
        }
        self.early_stop_tool = Some(name);
        Ok(self)
    }

    pub fn early_stop_tool(&self) -> Option<&str> {
        self.early_stop_tool.as_deref()
    }

    pub fn is_early_stop(&self, name: &str) -> bool {
        self.early_stop_tool.as_deref() == Some(name)
    }

    fn is_reserved(&self, name: &str) -> bool {
        name == EXCEPTION_TOOL || self.is_early_stop(name)
    }

    /// Case-sensitive lookup.
    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs `tool` and converts any failure into an observation string.
    pub async fn invoke(&self, tool: &dyn Tool, input: &str) -> String {
        match tool.call(input).await {
            Ok(observation) => observation,
            Err(error) => {
                tracing::warn!(tool = tool.name(), error = %error, "tool invocation failed");
                format!("Tool '{}' failed: {error}", tool.name())
            }
        }
    }

    /// Resolves and runs the action's tool. Never fails: an unknown tool
    /// yields a [`NO_SUCH_TOOL`] observation the model can correct on.
    pub async fn dispatch(&self, action: &AgentAction) -> String {
        match self.resolve(&action.tool) {
            Some(tool) => self.invoke(tool.as_ref(), &action.tool_input).await,
            None => {
                tracing::warn!(tool = %action.tool, "model selected an unknown tool");
                format!(
                    "{NO_SUCH_TOOL}: {}. Valid tools are: {}",
                    action.tool,
                    self.names().join(", ")
                )
            }
        }
    }
}
