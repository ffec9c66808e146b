//! Post writing assistant.

use tracing::warn;

use crate::client::{ChatMessage, ServiceClient, parse_json_reply};
use crate::types::{AiError, AssistantRequest, ServiceConfig, ToolResponse, WritingAssistance};

const SYSTEM_PROMPT: &str = "You are a writing assistant for short social posts. \
Respond ONLY with a JSON object of the exact shape \
{\"suggestions\": [string], \"hashtags\": [string], \"improvements\": [string]} \
with no surrounding prose. \"suggestions\" are alternative phrasings of the \
whole post, \"hashtags\" are lowercase tags without the # sign, and \
\"improvements\" are concrete edits to the existing text.";

/// Suggests improvements, rephrasings, and hashtags for a draft post.
pub struct PostAssistant {
    client: ServiceClient,
}

impl PostAssistant {
    /// Create an assistant from service configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, AiError> {
        Ok(Self {
            client: ServiceClient::new(config)?,
        })
    }

    fn user_prompt(request: &AssistantRequest) -> String {
        let mut prompt = format!("Draft post:\n{}", request.content);
        if let Some(context) = &request.context {
            prompt.push_str(&format!("\n\nThread context:\n{}", context));
        }
        if let Some(tone) = request.tone {
            prompt.push_str(&format!(
                "\n\nDesired tone: {}",
                serde_json::to_string(&tone).unwrap_or_default().trim_matches('"')
            ));
        }
        if let Some(max_length) = request.max_length {
            prompt.push_str(&format!(
                "\n\nKeep suggestions under {} characters.",
                max_length
            ));
        }
        prompt
    }

    /// Get writing assistance for a draft. Failures come back inside the
    /// response envelope, never as a panic or a partial result.
    pub async fn assist(&self, request: &AssistantRequest) -> ToolResponse<WritingAssistance> {
        match self.try_assist(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("post assistant failed: {}", e);
                ToolResponse::failure(e.to_string())
            }
        }
    }

    async fn try_assist(
        &self,
        request: &AssistantRequest,
    ) -> Result<ToolResponse<WritingAssistance>, AiError> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::user_prompt(request)),
        ];
        let completion = self.client.complete(&messages).await?;
        let assistance: WritingAssistance = parse_json_reply(&completion.content)?;
        Ok(ToolResponse::success(assistance, completion.usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tone;

    #[test]
    fn test_user_prompt_includes_all_parts() {
        let request = AssistantRequest {
            content: "gm nostr".to_string(),
            context: Some("replying to a thread about relays".to_string()),
            tone: Some(Tone::Casual),
            max_length: Some(280),
        };

        let prompt = PostAssistant::user_prompt(&request);
        assert!(prompt.contains("gm nostr"));
        assert!(prompt.contains("replying to a thread about relays"));
        assert!(prompt.contains("casual"));
        assert!(prompt.contains("280"));
    }

    #[test]
    fn test_user_prompt_minimal() {
        let request = AssistantRequest {
            content: "hello".to_string(),
            context: None,
            tone: None,
            max_length: None,
        };

        let prompt = PostAssistant::user_prompt(&request);
        assert!(prompt.contains("hello"));
        assert!(!prompt.contains("tone"));
        assert!(!prompt.contains("characters"));
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(PostAssistant::new(ServiceConfig::default()).is_err());
    }
}
