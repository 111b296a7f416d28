use crate::action::AgentStep;

/// Labels used when replaying steps into the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchpadFormat {
    pub observation_prefix: String,
    pub llm_prefix: String,
}

impl Default for ScratchpadFormat {
    fn default() -> Self {
        Self {
            observation_prefix: "Observation: ".to_string(),
            llm_prefix: "Thought:".to_string(),
        }
    }
}

impl ScratchpadFormat {
    pub fn render_step(&self, step: &AgentStep) -> String {
        format!(
            "{}\n{}{}\n{}",
            step.action.log, self.observation_prefix, step.observation, self.llm_prefix
        )
    }

    /// Concatenates every step in order; empty for no steps.
    pub fn render(&self, steps: &[AgentStep]) -> String {
        steps.iter().map(|step| self.render_step(step)).collect()
    }
}
