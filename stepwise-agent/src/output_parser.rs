use std::sync::OnceLock;

use regex::Regex;
use stepwise_core::StepwiseError;

use crate::action::{AgentAction, AgentDecision, AgentFinish};

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Turns raw completion text into exactly one [`AgentDecision`].
pub trait OutputParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<AgentDecision, StepwiseError>;

    /// Key a parsed final answer is stored under.
    fn output_key(&self) -> &str;
}

fn action_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)Action\s*:(.*?)\n\s*Action\s*Input\s*:(.*)")
            .expect("action pattern is valid")
    })
}

fn clean(raw: &str) -> &str {
    raw.trim_matches(|c: char| c == '"' || c.is_whitespace())
}

/// Parses the `Action:` / `Action Input:` / `Final Answer:` line format.
///
/// A final answer wins over an action when both appear.
#[derive(Debug, Clone)]
pub struct ReActOutputParser {
    output_key: String,
}

impl Default for ReActOutputParser {
    fn default() -> Self {
        Self::new("output")
    }
}

impl ReActOutputParser {
    pub fn new(output_key: impl Into<String>) -> Self {
        Self {
            output_key: output_key.into(),
        }
    }
}

impl OutputParser for ReActOutputParser {
    fn output_key(&self) -> &str {
        &self.output_key
    }

    fn parse(&self, text: &str) -> Result<AgentDecision, StepwiseError> {
        if let Some(index) = text.find(FINAL_ANSWER_MARKER) {
            let answer = text[index + FINAL_ANSWER_MARKER.len()..].trim();
            let log = text[..index].trim();
            return Ok(AgentDecision::Finish(AgentFinish::single(
                self.output_key.clone(),
                answer,
                log,
            )));
        }

        let caps = action_pattern()
            .captures(text)
            .ok_or_else(|| StepwiseError::ParseFailed {
                output: text.to_string(),
                reason: "expected `Action:` followed by `Action Input:`, or `Final Answer:`"
                    .to_string(),
            })?;

        let tool = clean(&caps[1]);
        if tool.is_empty() {
            return Err(StepwiseError::ParseFailed {
                output: text.to_string(),
                reason: "`Action:` names no tool".to_string(),
            });
        }

        Ok(AgentDecision::Action(AgentAction {
            tool: tool.to_string(),
            tool_input: clean(&caps[2]).to_string(),
            log: text.to_string(),
        }))
    }
}
