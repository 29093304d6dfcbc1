//! Text-generation client boundary
//!
//! The build pipeline treats the external text-generation service as a black
//! box: one blocking call per prompt, with a fixed upper-bound timeout. The
//! default implementation speaks the OpenAI-compatible chat-completions wire
//! shape over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure modes of the generation boundary
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("generation request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

/// Errors resolving the generator configuration from the environment
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
}

/// External text-generation capability: `generate(prompt) -> text`
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Connection settings for the OpenAI-compatible generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Default upper bound for a single generation call
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

    /// Read the configuration from the process environment.
    ///
    /// Uses the same variable names the generated project's `.env` carries:
    /// `API_KEY`, `BASE_URL`, and `model_name`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            std::env::var("API_KEY").map_err(|_| ConfigError::MissingVar("API_KEY"))?;
        let base_url =
            std::env::var("BASE_URL").map_err(|_| ConfigError::MissingVar("BASE_URL"))?;
        let model =
            std::env::var("model_name").map_err(|_| ConfigError::MissingVar("model_name"))?;

        Ok(Self {
            base_url,
            api_key,
            model,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiCompatGenerator {
    client: Client,
    config: GeneratorConfig,
}

impl OpenAiCompatGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| GenerateError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.3,
            max_tokens: 8000,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::Timeout
                } else {
                    GenerateError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::Upstream(format!(
                "HTTP {status} from generation service"
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            GenerateError::Upstream(format!("malformed completion response: {e}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerateError::Upstream("completion contained no choices".to_string()))
    }
}
