use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use stepwise_core::{Runnable, StepwiseError, StreamEvent, Tool, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::action::{AgentAction, AgentDecision, AgentFinish, AgentStep};
use crate::agent::Agent;
use crate::config::{ExecutorConfig, ParseErrorPolicy, RunOptions, StoppingMethod};
use crate::tools::{ToolRegistry, EXCEPTION_TOOL};

/// Observation recorded for unparseable model output under
/// [`ParseErrorPolicy::Observe`].
pub const INVALID_RESPONSE_OBSERVATION: &str = "Invalid or incomplete response";

/// Result of one run. `intermediate_steps` is empty unless requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorOutput {
    pub return_values: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intermediate_steps: Vec<AgentStep>,
}

impl ExecutorOutput {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.return_values.get(key).map(String::as_str)
    }
}

#[derive(Default)]
struct EventSink(Option<mpsc::UnboundedSender<StreamEvent>>);

impl EventSink {
    fn emit(&self, event: StreamEvent) {
        if let Some(sender) = &self.0 {
            // The receiver only goes away when the stream is dropped.
            let _ = sender.send(event);
        }
    }
}

async fn cancellable<T>(
    token: &CancellationToken,
    fut: impl Future<Output = Result<T, StepwiseError>>,
) -> Result<T, StepwiseError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(StepwiseError::Cancelled),
        result = fut => result,
    }
}

/// Drives an [`Agent`] until it finishes, fails, or runs out of budget.
///
/// Each run owns its own step list, so one executor can serve concurrent runs.
pub struct AgentExecutor<A> {
    agent: A,
    tools: ToolRegistry,
    config: ExecutorConfig,
}

impl<A: std::fmt::Debug> std::fmt::Debug for AgentExecutor<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("config", &self.config)
            .finish()
    }
}

impl<A: Agent> AgentExecutor<A> {
    pub fn new(agent: A, tools: ToolRegistry) -> Self {
        Self {
            agent,
            tools,
            config: ExecutorConfig::default(),
        }
    }

    pub fn builder() -> AgentExecutorBuilder<A> {
        AgentExecutorBuilder::default()
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_iterations(mut self, max: Option<usize>) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn with_max_execution_time(mut self, max: Option<Duration>) -> Self {
        self.config.max_execution_time = max;
        self
    }

    pub fn with_early_stopping_method(mut self, method: StoppingMethod) -> Self {
        self.config.early_stopping_method = method;
        self
    }

    pub fn with_return_intermediate_steps(mut self, enabled: bool) -> Self {
        self.config.return_intermediate_steps = enabled;
        self
    }

    pub fn with_parse_error_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.config.parse_error_policy = policy;
        self
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub async fn run(
        &self,
        inputs: &HashMap<String, String>,
    ) -> Result<ExecutorOutput, StepwiseError> {
        self.run_with_options(inputs, &RunOptions::default()).await
    }

    pub async fn run_with_options(
        &self,
        inputs: &HashMap<String, String>,
        options: &RunOptions,
    ) -> Result<ExecutorOutput, StepwiseError> {
        self.execute(inputs, options, &CancellationToken::new(), EventSink::default())
            .await
    }

    /// Like [`run_with_options`](Self::run_with_options), but gives up with
    /// [`StepwiseError::Cancelled`] at the next model or tool await once
    /// `token` fires.
    pub async fn run_with_cancellation(
        &self,
        inputs: &HashMap<String, String>,
        options: &RunOptions,
        token: &CancellationToken,
    ) -> Result<ExecutorOutput, StepwiseError> {
        self.execute(inputs, options, token, EventSink::default())
            .await
    }

    async fn execute(
        &self,
        inputs: &HashMap<String, String>,
        options: &RunOptions,
        token: &CancellationToken,
        events: EventSink,
    ) -> Result<ExecutorOutput, StepwiseError> {
        let config = self.config.merge(options);
        for key in self.agent.input_keys() {
            if !inputs.contains_key(&key) {
                return Err(StepwiseError::MissingPromptVariable(key));
            }
        }

        let run_id = Uuid::new_v4();
        events.emit(StreamEvent::Metadata {
            key: "run_id".to_string(),
            value: Value::String(run_id.to_string()),
        });
        let span = tracing::info_span!("agent_executor", %run_id);
        self.run_loop(inputs, &config, token, &events)
            .instrument(span)
            .await
    }

    async fn run_loop(
        &self,
        inputs: &HashMap<String, String>,
        config: &ExecutorConfig,
        token: &CancellationToken,
        events: &EventSink,
    ) -> Result<ExecutorOutput, StepwiseError> {
        let started = Instant::now();
        let mut steps: Vec<AgentStep> = Vec::new();
        let mut iteration = 0usize;

        loop {
            tracing::debug!(iteration, "planning next step");
            let mut invalid_response = false;
            let decision = match cancellable(token, self.agent.plan(&steps, inputs)).await {
                Ok(decision) => decision,
                Err(StepwiseError::ParseFailed { output, reason })
                    if config.parse_error_policy == ParseErrorPolicy::Observe =>
                {
                    tracing::warn!(%reason, "unparseable model output recorded as observation");
                    invalid_response = true;
                    AgentDecision::Action(AgentAction {
                        tool: EXCEPTION_TOOL.to_string(),
                        tool_input: output.clone(),
                        log: output,
                    })
                }
                Err(error) => return Err(error),
            };

            let action = match decision {
                AgentDecision::Finish(finish) => {
                    tracing::debug!(iteration, "agent finished");
                    return self.finish(finish, steps, config, events);
                }
                AgentDecision::Action(action) => action,
            };
            events.emit(StreamEvent::ContentChunk(action.log.clone()));

            if self.tools.is_early_stop(&action.tool) {
                tracing::info!(tool = %action.tool, "early stop tool selected");
                let return_values = self
                    .agent
                    .return_values()
                    .into_iter()
                    .map(|key| (key, action.tool_input.clone()))
                    .collect();
                let finish = AgentFinish::new(return_values, action.log.clone());
                return self.finish(finish, steps, config, events);
            }

            if !config.within_budget(iteration + 1, started.elapsed()) {
                tracing::info!(
                    iterations = iteration,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    method = ?config.early_stopping_method,
                    "agent budget exhausted"
                );
                let finish = self.stopping_finish(&steps, inputs, config, token).await?;
                return self.finish(finish, steps, config, events);
            }

            let observation = if invalid_response {
                INVALID_RESPONSE_OBSERVATION.to_string()
            } else {
                let call_id = Uuid::new_v4().to_string();
                events.emit(StreamEvent::ToolCallStart {
                    id: call_id.clone(),
                    name: action.tool.clone(),
                    input: action.tool_input.clone(),
                });
                let observation =
                    cancellable(token, async {
                        Ok::<_, StepwiseError>(self.tools.dispatch(&action).await)
                    })
                    .await?;
                events.emit(StreamEvent::ToolCallResult {
                    id: call_id,
                    output: observation.clone(),
                });
                observation
            };

            tracing::debug!(iteration, tool = %action.tool, "step recorded");
            steps.push(AgentStep {
                action,
                observation,
            });
            iteration += 1;
        }
    }

    async fn stopping_finish(
        &self,
        steps: &[AgentStep],
        inputs: &HashMap<String, String>,
        config: &ExecutorConfig,
        token: &CancellationToken,
    ) -> Result<AgentFinish, StepwiseError> {
        match config.early_stopping_method {
            StoppingMethod::Force => Ok(AgentFinish::stopped(&self.agent.return_values())),
            StoppingMethod::Generate => {
                match cancellable(token, self.agent.default_stopping_finish(steps, inputs)).await {
                    Err(StepwiseError::ParseFailed { .. }) => {
                        Ok(AgentFinish::stopped(&self.agent.return_values()))
                    }
                    other => other,
                }
            }
        }
    }

    fn finish(
        &self,
        finish: AgentFinish,
        steps: Vec<AgentStep>,
        config: &ExecutorConfig,
        events: &EventSink,
    ) -> Result<ExecutorOutput, StepwiseError> {
        let keys = self.agent.return_values();
        let mut return_values = HashMap::with_capacity(keys.len());
        for key in &keys {
            let value = finish.return_values.get(key).ok_or_else(|| {
                StepwiseError::Custom(format!("agent finish is missing return value '{key}'"))
            })?;
            return_values.insert(key.clone(), value.clone());
        }

        if let Some(answer) = keys.first().and_then(|key| return_values.get(key)) {
            events.emit(StreamEvent::FinalAnswer(answer.clone()));
        }

        Ok(ExecutorOutput {
            return_values,
            intermediate_steps: if config.return_intermediate_steps {
                steps
            } else {
                Vec::new()
            },
        })
    }
}

enum Progress {
    Event(StreamEvent),
    Done(Result<ExecutorOutput, StepwiseError>),
}

#[async_trait::async_trait]
impl<A: Agent> Runnable<HashMap<String, String>, ExecutorOutput> for AgentExecutor<A> {
    async fn invoke(
        &self,
        input: HashMap<String, String>,
    ) -> Result<ExecutorOutput, StepwiseError> {
        self.run(&input).await
    }

    fn stream(
        &self,
        input: HashMap<String, String>,
    ) -> BoxStream<'_, Result<StreamEvent, StepwiseError>> {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        async_stream::stream! {
            let options = RunOptions::default();
            let token = CancellationToken::new();
            let run = self.execute(&input, &options, &token, EventSink(Some(sender)));
            tokio::pin!(run);

            let outcome = loop {
                let progress = tokio::select! {
                    result = &mut run => Progress::Done(result),
                    Some(event) = receiver.recv() => Progress::Event(event),
                };
                match progress {
                    Progress::Event(event) => yield Ok(event),
                    Progress::Done(result) => break result,
                }
            };

            while let Ok(event) = receiver.try_recv() {
                yield Ok(event);
            }
            if let Err(error) = outcome {
                yield Err(error);
            }
        }
        .boxed()
    }
}

/// Assembles an [`AgentExecutor`] from an agent, its tools, and limits.
pub struct AgentExecutorBuilder<A> {
    agent: Option<A>,
    tools: Vec<Arc<dyn Tool>>,
    early_stop_tool: Option<String>,
    config: ExecutorConfig,
}

impl<A> Default for AgentExecutorBuilder<A> {
    fn default() -> Self {
        Self {
            agent: None,
            tools: Vec::new(),
            early_stop_tool: None,
            config: ExecutorConfig::default(),
        }
    }
}

impl<A: Agent> AgentExecutorBuilder<A> {
    pub fn agent(mut self, agent: A) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn early_stop_tool(mut self, name: impl Into<String>) -> Self {
        self.early_stop_tool = Some(name.into());
        self
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_iterations(mut self, max: Option<usize>) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn max_execution_time(mut self, max: Option<Duration>) -> Self {
        self.config.max_execution_time = max;
        self
    }

    pub fn early_stopping_method(mut self, method: StoppingMethod) -> Self {
        self.config.early_stopping_method = method;
        self
    }

    pub fn return_intermediate_steps(mut self, enabled: bool) -> Self {
        self.config.return_intermediate_steps = enabled;
        self
    }

    pub fn parse_error_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.config.parse_error_policy = policy;
        self
    }

    pub fn build(self) -> Result<AgentExecutor<A>, StepwiseError> {
        let agent = self
            .agent
            .ok_or_else(|| StepwiseError::InvalidConfig("missing agent".to_string()))?;
        let mut tools = ToolRegistry::from_tools(self.tools)?;
        if let Some(name) = self.early_stop_tool {
            tools = tools.with_early_stop_tool(name)?;
        }
        Ok(AgentExecutor::new(agent, tools).with_config(self.config))
    }
}
