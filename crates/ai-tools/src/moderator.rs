//! Content moderation tool.

use tracing::warn;

use crate::client::{ChatMessage, ServiceClient, parse_json_reply};
use crate::types::{AiError, ModerationResult, ServiceConfig, Strictness, ToolResponse};

const SYSTEM_PROMPT: &str = "You are a content moderator for a social network. \
Judge the given post and respond ONLY with a JSON object of the exact shape \
{\"is_appropriate\": bool, \"confidence\": number, \"reasons\": [string], \
\"categories\": [string], \"suggested_action\": \"allow\"|\"warn\"|\"block\"} \
with no surrounding prose. \"confidence\" is between 0 and 1.";

/// Classifies content against community guidelines.
pub struct ContentModerator {
    client: ServiceClient,
}

impl ContentModerator {
    /// Create a moderator from service configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, AiError> {
        Ok(Self {
            client: ServiceClient::new(config)?,
        })
    }

    fn user_prompt(content: &str, strictness: Strictness) -> String {
        let level = match strictness {
            Strictness::Low => "Only flag clearly harmful content (threats, doxxing, scams).",
            Strictness::Medium => "Flag harmful content and likely spam.",
            Strictness::High => {
                "Flag harmful content, spam, and anything borderline inappropriate."
            }
        };
        format!("{}\n\nPost to moderate:\n{}", level, content)
    }

    /// Moderate a piece of content. Failures come back inside the response
    /// envelope; the caller decides how to treat an unmoderated post.
    pub async fn moderate(
        &self,
        content: &str,
        strictness: Strictness,
    ) -> ToolResponse<ModerationResult> {
        match self.try_moderate(content, strictness).await {
            Ok(response) => response,
            Err(e) => {
                warn!("content moderation failed: {}", e);
                ToolResponse::failure(e.to_string())
            }
        }
    }

    async fn try_moderate(
        &self,
        content: &str,
        strictness: Strictness,
    ) -> Result<ToolResponse<ModerationResult>, AiError> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::user_prompt(content, strictness)),
        ];
        let completion = self.client.complete(&messages).await?;
        let result: ModerationResult = parse_json_reply(&completion.content)?;
        Ok(ToolResponse::success(result, completion.usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_varies_by_strictness() {
        let low = ContentModerator::user_prompt("post", Strictness::Low);
        let high = ContentModerator::user_prompt("post", Strictness::High);
        assert_ne!(low, high);
        assert!(low.contains("post"));
        assert!(high.contains("borderline"));
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(ContentModerator::new(ServiceConfig::default()).is_err());
    }
}
