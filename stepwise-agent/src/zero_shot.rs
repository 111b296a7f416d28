//! The reference agent: reason step by step and pick one tool per turn.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stepwise_chains::LlmChain;
use stepwise_core::{Llm, LlmRequest, StepwiseError, Tool};
use stepwise_prompt::PromptTemplate;

use crate::action::{AgentDecision, AgentFinish, AgentStep};
use crate::agent::Agent;
use crate::output_parser::{OutputParser, ReActOutputParser};
use crate::scratchpad::ScratchpadFormat;

pub const SCRATCHPAD_KEY: &str = "agent_scratchpad";
pub const OBSERVATION_STOP: &str = "\nObservation:";

pub const DEFAULT_PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:";

pub const DEFAULT_FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

pub const DEFAULT_SUFFIX: &str = "Begin!

Question: {{input}}
Thought:{{agent_scratchpad}}";

const FORCE_FINISH_THOUGHT: &str =
    "\n\nI now need to return a final answer based on the previous steps:";

/// Pieces assembled into the zero-shot prompt.
///
/// `{tool_names}` in `format_instructions` is replaced with the comma-separated
/// tool names. When `input_variables` is set, the built template must
/// reference exactly those variables.
#[derive(Debug, Clone)]
pub struct PromptArgs {
    pub prefix: String,
    pub suffix: String,
    pub format_instructions: String,
    pub input_variables: Option<Vec<String>>,
}

impl Default for PromptArgs {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            format_instructions: DEFAULT_FORMAT_INSTRUCTIONS.to_string(),
            input_variables: None,
        }
    }
}

/// Saved form of a [`ZeroShotAgent`]. The model and tool implementations are
/// supplied again when it is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedZeroShotAgent {
    pub prompt: String,
    pub allowed_tools: Vec<String>,
    #[serde(default = "default_output_key")]
    pub output_key: String,
}

fn default_output_key() -> String {
    "output".to_string()
}

/// Any saved agent, tagged by its `_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum SerializedAgent {
    #[serde(rename = "zero-shot-react-description")]
    ZeroShotReactDescription(SerializedZeroShotAgent),
}

pub struct ZeroShotAgent {
    chain: LlmChain,
    allowed_tools: Vec<String>,
    parser: Box<dyn OutputParser>,
    format: ScratchpadFormat,
}

impl std::fmt::Debug for ZeroShotAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZeroShotAgent")
            .field("chain", &self.chain)
            .field("allowed_tools", &self.allowed_tools)
            .field("format", &self.format)
            .finish()
    }
}

impl ZeroShotAgent {
    pub fn validate_tools(tools: &[Arc<dyn Tool>]) -> Result<(), StepwiseError> {
        if tools.is_empty() {
            return Err(StepwiseError::InvalidConfig(
                "a zero-shot agent requires at least one tool".to_string(),
            ));
        }
        Ok(())
    }

    pub fn create_prompt(
        tools: &[Arc<dyn Tool>],
        args: &PromptArgs,
    ) -> Result<PromptTemplate, StepwiseError> {
        let tool_lines = tools
            .iter()
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let tool_names = tools
            .iter()
            .map(|tool| tool.name())
            .collect::<Vec<_>>()
            .join(", ");
        let instructions = args.format_instructions.replace("{tool_names}", &tool_names);

        let template = PromptTemplate::new(format!(
            "{}\n\n{}\n\n{}\n\n{}",
            args.prefix, tool_lines, instructions, args.suffix
        ));

        if let Some(expected) = &args.input_variables {
            let mut found = template.input_variables();
            let mut expected = expected.clone();
            found.sort();
            expected.sort();
            if found != expected {
                return Err(StepwiseError::InvalidConfig(format!(
                    "prompt variables {found:?} do not match declared input variables {expected:?}"
                )));
            }
        }
        Ok(template)
    }

    pub fn from_llm_and_tools(
        llm: Arc<dyn Llm>,
        tools: &[Arc<dyn Tool>],
        args: PromptArgs,
    ) -> Result<Self, StepwiseError> {
        Self::validate_tools(tools)?;
        let prompt = Self::create_prompt(tools, &args)?;
        let allowed_tools = tools.iter().map(|tool| tool.name().to_string()).collect();
        Self::assemble(prompt, llm, allowed_tools, ReActOutputParser::default())
    }

    fn assemble(
        prompt: PromptTemplate,
        llm: Arc<dyn Llm>,
        allowed_tools: Vec<String>,
        parser: impl OutputParser + 'static,
    ) -> Result<Self, StepwiseError> {
        if !prompt.input_variables().iter().any(|v| v == SCRATCHPAD_KEY) {
            return Err(StepwiseError::InvalidConfig(format!(
                "prompt must reference {{{{{SCRATCHPAD_KEY}}}}}"
            )));
        }
        Ok(Self {
            chain: LlmChain::new(prompt, llm),
            allowed_tools,
            parser: Box::new(parser),
            format: ScratchpadFormat::default(),
        })
    }

    /// Captures the prompt, tool names and output key.
    pub fn serialize(&self) -> SerializedAgent {
        SerializedAgent::ZeroShotReactDescription(SerializedZeroShotAgent {
            prompt: self.prompt().template().to_string(),
            allowed_tools: self.allowed_tools.clone(),
            output_key: self.parser.output_key().to_string(),
        })
    }

    /// Rebuilds an agent from its saved form. Every allowed tool must be
    /// present in `tools`.
    pub fn deserialize(
        data: SerializedZeroShotAgent,
        llm: Arc<dyn Llm>,
        tools: &[Arc<dyn Tool>],
    ) -> Result<Self, StepwiseError> {
        Self::validate_tools(tools)?;
        if let Some(missing) = data
            .allowed_tools
            .iter()
            .find(|name| !tools.iter().any(|tool| tool.name() == name.as_str()))
        {
            return Err(StepwiseError::InvalidConfig(format!(
                "saved agent allows tool '{missing}' but it was not provided"
            )));
        }
        Self::assemble(
            PromptTemplate::new(data.prompt),
            llm,
            data.allowed_tools,
            ReActOutputParser::new(data.output_key),
        )
    }

    pub fn with_output_parser(mut self, parser: impl OutputParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn allowed_tools(&self) -> &[String] {
        &self.allowed_tools
    }

    pub fn prompt(&self) -> &PromptTemplate {
        self.chain.prompt()
    }

    pub fn scratchpad_format(&self) -> &ScratchpadFormat {
        &self.format
    }

    fn prompt_with_scratchpad(
        &self,
        inputs: &HashMap<String, String>,
        scratchpad: String,
    ) -> Result<String, StepwiseError> {
        let mut vars = inputs.clone();
        vars.insert(SCRATCHPAD_KEY.to_string(), scratchpad);
        self.chain.prompt().format(&vars)
    }

    async fn complete(&self, prompt: String) -> Result<String, StepwiseError> {
        let request = LlmRequest::new(prompt).with_stop(vec![OBSERVATION_STOP.to_string()]);
        Ok(self.chain.llm().complete(request).await?.text)
    }
}

#[async_trait]
impl Agent for ZeroShotAgent {
    fn input_keys(&self) -> Vec<String> {
        self.chain
            .input_keys()
            .into_iter()
            .filter(|key| key != SCRATCHPAD_KEY)
            .collect()
    }

    fn return_values(&self) -> Vec<String> {
        vec![self.parser.output_key().to_string()]
    }

    fn construct_prompt(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> Result<String, StepwiseError> {
        self.prompt_with_scratchpad(inputs, self.format.render(steps))
    }

    async fn plan(
        &self,
        steps: &[AgentStep],
        inputs: &HashMap<String, String>,
    ) -> Result<AgentDecision, StepwiseError> {
        let prompt = self.construct_prompt(inputs, steps)?;
        let text = self.complete(prompt).await?;
        self.parser.parse(&text)
    }

    async fn default_stopping_finish(
        &self,
        steps: &[AgentStep],
        inputs: &HashMap<String, String>,
    ) -> Result<AgentFinish, StepwiseError> {
        let mut scratchpad = self.format.render(steps);
        scratchpad.push_str(FORCE_FINISH_THOUGHT);
        scratchpad.push_str(&self.format.llm_prefix);
        let prompt = self.prompt_with_scratchpad(inputs, scratchpad)?;
        let text = self.complete(prompt).await?;
        match self.parser.parse(&text) {
            Ok(AgentDecision::Finish(finish)) => Ok(finish),
            Ok(AgentDecision::Action(_)) | Err(StepwiseError::ParseFailed { .. }) => {
                tracing::info!("forced finish did not produce a final answer");
                Ok(AgentFinish::stopped(&self.return_values()))
            }
            Err(error) => Err(error),
        }
    }
}
