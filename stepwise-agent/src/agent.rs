use std::collections::HashMap;

use async_trait::async_trait;
use stepwise_core::StepwiseError;

use crate::action::{AgentDecision, AgentFinish, AgentStep};

/// A strategy that decides the next action from the objective and the steps
/// taken so far. Implementations are selected when the executor is built.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Objective variables the caller must supply.
    fn input_keys(&self) -> Vec<String>;

    /// Keys a finish is expected to carry.
    fn return_values(&self) -> Vec<String> {
        vec!["output".to_string()]
    }

    /// Full prompt text for the next model call.
    fn construct_prompt(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> Result<String, StepwiseError>;

    /// Asks the model for the next move. Parse failures are returned as-is.
    async fn plan(
        &self,
        steps: &[AgentStep],
        inputs: &HashMap<String, String>,
    ) -> Result<AgentDecision, StepwiseError>;

    /// Finish used by [`StoppingMethod::Generate`](crate::StoppingMethod::Generate)
    /// once the budget runs out.
    async fn default_stopping_finish(
        &self,
        steps: &[AgentStep],
        inputs: &HashMap<String, String>,
    ) -> Result<AgentFinish, StepwiseError> {
        let _ = (steps, inputs);
        Ok(AgentFinish::stopped(&self.return_values()))
    }
}
