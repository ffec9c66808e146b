//! Completion service client.
//!
//! Speaks the OpenRouter-style chat-completion API: bearer auth, referer
//! and title headers, `{model, messages}` request, first-choice content and
//! token usage out. Everything above this client works with plain strings
//! and parses them strictly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AiError, ServiceConfig, TokenUsage};

/// One chat message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    /// A system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// A completion: the model's text plus token accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

/// Usage block as the completion API reports it (snake_case).
#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<ApiUsage> for TokenUsage {
    fn from(usage: ApiUsage) -> Self {
        TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for the completion service. Construct one per configuration;
/// instances are independent and hold no global state.
pub struct ServiceClient {
    config: ServiceConfig,
    http: reqwest::Client,
}

impl ServiceClient {
    /// Create a client, validating the configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, AiError> {
        if config.api_key.is_empty() {
            return Err(AiError::Config("API key is required".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Config(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Service configuration in use.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run a chat completion and return the first choice.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, AiError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("requesting completion from {}", url);

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: 1000,
            temperature: 0.7,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.site_url)
            .header("X-Title", &self.config.site_name)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api(format!("{}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Api("response contained no choices".to_string()))?;

        Ok(Completion {
            content: choice.message.content,
            usage: parsed.usage.map(TokenUsage::from),
        })
    }
}

/// Parse a model reply as strict JSON of type `T`.
///
/// Models often wrap JSON in markdown fences; those are stripped first.
/// Anything that does not deserialize into the complete expected shape is a
/// [`AiError::Parse`] — no partial values.
pub fn parse_json_reply<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, AiError> {
    let trimmed = content.trim();
    let without_fences = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_start())
        .map(|rest| rest.strip_suffix("```").unwrap_or(rest))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(without_fences).map_err(|e| AiError::Parse(e.to_string()))
}
