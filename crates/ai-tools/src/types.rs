//! Types for the AI tools adapter.
//!
//! The core consumes AI services only through the envelope contract here:
//! a request carries opaque content, a [`ToolResponse`] carries either a
//! fully-parsed typed result or an error — never a partially-filled value.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors inside the adapter. Tool entry points fold these into
/// [`ToolResponse::failure`] so the envelope contract holds at the boundary.
#[derive(Debug, Error)]
pub enum AiError {
    /// Bad or missing configuration (e.g. empty API key)
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure
    #[error("http error: {0}")]
    Http(String),

    /// The service answered with a non-success status or an empty result
    #[error("api error: {0}")]
    Api(String),

    /// The service's output did not parse into the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}

/// Connection settings for the completion service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bearer token; must be non-empty
    pub api_key: String,
    /// Completion endpoint base
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Referer header value
    pub site_url: String,
    /// Title header value
    pub site_name: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "anthropic/claude-3.5-sonnet".to_string(),
            site_url: "https://relay16.app".to_string(),
            site_name: "Relay16".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Token accounting surfaced in the response envelope.
///
/// Envelope field names are camelCase on the wire; the service client maps
/// the completion API's snake_case usage block into this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The adapter's response envelope: `success` with `data` and optional
/// `usage`, or `error` with a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl<T> ToolResponse<T> {
    /// A successful envelope.
    pub fn success(data: T, usage: Option<TokenUsage>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            usage,
        }
    }

    /// A failed envelope.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            usage: None,
        }
    }
}

/// Requested writing tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Casual,
    Professional,
    Friendly,
    Formal,
}

/// A post draft to improve.
#[derive(Debug, Clone)]
pub struct AssistantRequest {
    /// Draft content
    pub content: String,
    /// Optional thread or reply context
    pub context: Option<String>,
    /// Desired tone
    pub tone: Option<Tone>,
    /// Soft cap on the improved draft's length
    pub max_length: Option<usize>,
}

/// Structured writing help for a draft post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingAssistance {
    /// Alternative phrasings of the whole draft
    pub suggestions: Vec<String>,
    /// Suggested hashtags (without `#`)
    pub hashtags: Vec<String>,
    /// Specific improvements to the existing text
    pub improvements: Vec<String>,
}

/// Moderation strictness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Low,
    Medium,
    High,
}

/// Recommended handling of moderated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    Allow,
    Warn,
    Block,
}

/// Moderation verdict for a piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub is_appropriate: bool,
    /// Confidence in the verdict, 0.0 to 1.0
    pub confidence: f32,
    pub reasons: Vec<String>,
    pub categories: Vec<String>,
    pub suggested_action: SuggestedAction,
}

/// Overall conversation sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

/// A thread to summarize: rendered note contents in display order.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// Messages, oldest first
    pub messages: Vec<String>,
    /// Soft cap on the summary length in characters
    pub max_length: Option<usize>,
}

/// Structured summary of a conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub summary: String,
    pub key_points: Vec<String>,
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let response = ToolResponse::success(
            "data".to_string(),
            Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        );
        assert!(response.success);
        assert_eq!(response.data.as_deref(), Some("data"));
        assert!(response.error.is_none());
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_envelope_failure() {
        let response: ToolResponse<String> = ToolResponse::failure("boom");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_envelope_wire_shape() {
        let response: ToolResponse<String> = ToolResponse::failure("nope");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"nope"}"#);
    }

    #[test]
    fn test_moderation_result_requires_all_fields() {
        // a partially-filled object must not parse as valid
        let incomplete = r#"{"is_appropriate":true,"confidence":0.9}"#;
        assert!(serde_json::from_str::<ModerationResult>(incomplete).is_err());

        let complete = r#"{"is_appropriate":true,"confidence":0.9,"reasons":[],"categories":[],"suggested_action":"allow"}"#;
        let result: ModerationResult = serde_json::from_str(complete).unwrap();
        assert_eq!(result.suggested_action, SuggestedAction::Allow);
    }

    #[test]
    fn test_sentiment_serde() {
        assert_eq!(
            serde_json::from_str::<Sentiment>(r#""mixed""#).unwrap(),
            Sentiment::Mixed
        );
        assert_eq!(serde_json::to_string(&Sentiment::Neutral).unwrap(), r#""neutral""#);
    }
}
