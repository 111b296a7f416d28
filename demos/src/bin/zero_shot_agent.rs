use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use stepwise_agent::{initialize_agent_executor, AgentType, RunOptions, StoppingMethod};
use stepwise_core::{Llm, Retrying, Tool, ToolError};
use stepwise_llm::OpenAiCompletionClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Evaluates `+ - * /` expressions with parentheses.
struct Calculator;

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        loop {
            self.skip_ws();
            match self.chars.next_if(|c| *c == '+' || *c == '-') {
                Some('+') => value += self.term()?,
                Some(_) => value -= self.term()?,
                None => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.factor()?;
        loop {
            self.skip_ws();
            match self.chars.next_if(|c| *c == '*' || *c == '/') {
                Some('*') => value *= self.factor()?,
                Some(_) => {
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(ToolError::InvalidInput("division by zero".to_string()));
                    }
                    value /= divisor;
                }
                None => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, ToolError> {
        self.skip_ws();
        if self.chars.next_if_eq(&'-').is_some() {
            return Ok(-self.factor()?);
        }
        if self.chars.next_if_eq(&'(').is_some() {
            let value = self.expr()?;
            self.skip_ws();
            return match self.chars.next() {
                Some(')') => Ok(value),
                _ => Err(ToolError::InvalidInput("unbalanced parentheses".to_string())),
            };
        }
        let mut digits = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            digits.push(c);
        }
        digits
            .parse()
            .map_err(|_| ToolError::InvalidInput(format!("expected a number, found {digits:?}")))
    }
}

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "Calculator"
    }

    fn description(&self) -> &str {
        "Useful for when you need to answer questions about math. \
         Input is an arithmetic expression."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let mut parser = Parser {
            chars: input.chars().peekable(),
        };
        let value = parser.expr()?;
        parser.skip_ws();
        if let Some(extra) = parser.chars.next() {
            return Err(ToolError::InvalidInput(format!("unexpected character {extra:?}")));
        }
        Ok(value.to_string())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepwise_agent=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = OpenAiCompletionClient::from_env()?;
    tracing::info!(model = client.model(), "using completion model");
    let llm: Arc<dyn Llm> = Arc::new(Retrying::new(client, 3));

    let executor = initialize_agent_executor(
        vec![Arc::new(Calculator) as Arc<dyn Tool>],
        llm,
        AgentType::ZeroShotReactDescription,
    )?;

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What is (17 * 23) - 19 divided by 4?".to_string());
    let inputs = HashMap::from([("input".to_string(), question)]);
    let options = RunOptions::new()
        .max_iterations(6)
        .early_stopping_method(StoppingMethod::Generate)
        .return_intermediate_steps(true);

    let output = executor.run_with_options(&inputs, &options).await?;
    for step in &output.intermediate_steps {
        println!("{} <- {:?}: {}", step.action.tool, step.action.tool_input, step.observation);
    }
    println!("{}", output.get("output").unwrap_or_default());

    Ok(())
}
