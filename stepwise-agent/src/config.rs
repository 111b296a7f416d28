use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the executor does once the budget is spent without a finish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoppingMethod {
    /// Return the fixed stopped sentinel.
    #[default]
    Force,
    /// Ask the agent for one last answer.
    Generate,
}

/// How the executor treats model output that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseErrorPolicy {
    /// Abort the run with the parse error.
    #[default]
    Fail,
    /// Record the failure as an observation and keep going.
    Observe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub max_iterations: Option<usize>,
    pub max_execution_time: Option<Duration>,
    pub early_stopping_method: StoppingMethod,
    pub return_intermediate_steps: bool,
    pub parse_error_policy: ParseErrorPolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: Some(15),
            max_execution_time: None,
            early_stopping_method: StoppingMethod::Force,
            return_intermediate_steps: false,
            parse_error_policy: ParseErrorPolicy::Fail,
        }
    }
}

/// Per-run overrides. Unset fields fall back to the executor's config.
///
/// `max_iterations: Some(None)` lifts the iteration limit for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default)]
    pub max_iterations: Option<Option<usize>>,
    #[serde(default)]
    pub max_execution_time_ms: Option<u64>,
    #[serde(default)]
    pub early_stopping_method: Option<StoppingMethod>,
    #[serde(default)]
    pub return_intermediate_steps: Option<bool>,
    #[serde(default)]
    pub parse_error_policy: Option<ParseErrorPolicy>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(Some(max));
        self
    }

    pub fn unbounded_iterations(mut self) -> Self {
        self.max_iterations = Some(None);
        self
    }

    pub fn max_execution_time_ms(mut self, millis: u64) -> Self {
        self.max_execution_time_ms = Some(millis);
        self
    }

    pub fn early_stopping_method(mut self, method: StoppingMethod) -> Self {
        self.early_stopping_method = Some(method);
        self
    }

    pub fn return_intermediate_steps(mut self, enabled: bool) -> Self {
        self.return_intermediate_steps = Some(enabled);
        self
    }

    pub fn parse_error_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.parse_error_policy = Some(policy);
        self
    }
}

impl ExecutorConfig {
    pub fn merge(&self, options: &RunOptions) -> Self {
        Self {
            max_iterations: options.max_iterations.unwrap_or(self.max_iterations),
            max_execution_time: options
                .max_execution_time_ms
                .map(Duration::from_millis)
                .or(self.max_execution_time),
            early_stopping_method: options
                .early_stopping_method
                .unwrap_or(self.early_stopping_method),
            return_intermediate_steps: options
                .return_intermediate_steps
                .unwrap_or(self.return_intermediate_steps),
            parse_error_policy: options.parse_error_policy.unwrap_or(self.parse_error_policy),
        }
    }

    /// Whether the loop may run iteration number `next_iteration` (1-based)
    /// after `elapsed` time. Unset limits never stop the loop.
    pub fn within_budget(&self, next_iteration: usize, elapsed: Duration) -> bool {
        let iterations_ok = self.max_iterations.map_or(true, |max| next_iteration <= max);
        let time_ok = self.max_execution_time.map_or(true, |max| elapsed < max);
        iterations_ok && time_ok
    }
}
