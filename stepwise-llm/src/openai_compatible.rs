//! OpenAI-compatible text completion client
//!
//! Talks to any provider exposing the legacy `/completions` endpoint (OpenAI,
//! vLLM, llama.cpp server, ...).

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use stepwise_core::{enforce_stop_sequences, Llm, LlmRequest, LlmResponse, StepwiseError};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";

/// Request body for the completions endpoint
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionChoice {
    pub text: String,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// OpenAI-style error response
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiError {
    pub error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiCompletionClient {
    http: Client,
    endpoint: Url,
    api_key: SecretString,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl fmt::Debug for OpenAiCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompletionClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiCompletionClient {
    pub fn builder() -> OpenAiCompletionBuilder {
        OpenAiCompletionBuilder::default()
    }

    /// Reads `OPENAI_API_KEY` (required), `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    pub fn from_env() -> Result<Self, StepwiseError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            StepwiseError::InvalidConfig("OPENAI_API_KEY is not set".to_string())
        })?;
        let mut builder = Self::builder().api_key(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            builder = builder.base_url(base_url);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            builder = builder.model(model);
        }
        builder.build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_transport_error(&self, err: reqwest::Error) -> StepwiseError {
        if err.is_timeout() {
            StepwiseError::Timeout(self.timeout)
        } else {
            StepwiseError::LlmProvider(err.to_string())
        }
    }
}

#[derive(Default, Clone)]
pub struct OpenAiCompletionBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
}

impl fmt::Debug for OpenAiCompletionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };

        f.debug_struct("OpenAiCompletionBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &api_key)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiCompletionBuilder {
    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = Some(value.into());
        self
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.api_key = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };
        self
    }

    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.model = Some(value.into());
        self
    }

    pub fn temperature(mut self, value: f32) -> Self {
        self.temperature = Some(value);
        self
    }

    pub fn max_tokens(mut self, value: u32) -> Self {
        self.max_tokens = Some(value);
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = Some(value);
        self
    }

    pub fn build(self) -> Result<OpenAiCompletionClient, StepwiseError> {
        let api_key = self
            .api_key
            .ok_or_else(|| StepwiseError::InvalidConfig("missing api key".to_string()))?;

        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = if base_url.ends_with('/') {
            base_url
        } else {
            format!("{base_url}/")
        };
        let endpoint = Url::parse(&base_url)
            .and_then(|base| base.join("completions"))
            .map_err(|err| StepwiseError::InvalidConfig(format!("invalid base url: {err}")))?;

        let timeout = self.timeout.unwrap_or(Duration::from_secs(120));
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StepwiseError::LlmProvider(err.to_string()))?;

        Ok(OpenAiCompletionClient {
            http,
            endpoint,
            api_key: SecretString::new(api_key),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl Llm for OpenAiCompletionClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        let LlmRequest { prompt, stop } = request;
        let body = CompletionRequest {
            model: self.model.clone(),
            prompt,
            stop: stop.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&raw)
                .map(|parsed| parsed.error.message)
                .unwrap_or(raw);
            tracing::debug!(%status, "completion request rejected");
            return Err(StepwiseError::LlmProvider(format!("{status}: {message}")));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|err| self.map_transport_error(err))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| StepwiseError::LlmProvider("no choices returned".to_string()))?;

        Ok(LlmResponse {
            text: enforce_stop_sequences(&choice.text, &stop),
        })
    }
}
