//! Conversation summarization tool.

use tracing::warn;

use crate::client::{ChatMessage, ServiceClient, parse_json_reply};
use crate::types::{AiError, ConversationSummary, ServiceConfig, SummaryRequest, ToolResponse};

const SYSTEM_PROMPT: &str = "You summarize social media conversation threads. \
Respond ONLY with a JSON object of the exact shape \
{\"summary\": string, \"key_points\": [string], \
\"sentiment\": \"positive\"|\"negative\"|\"neutral\"|\"mixed\", \
\"topics\": [string]} with no surrounding prose.";

/// Produces structured summaries of conversation threads.
pub struct ConversationSummarizer {
    client: ServiceClient,
}

impl ConversationSummarizer {
    /// Create a summarizer from service configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, AiError> {
        Ok(Self {
            client: ServiceClient::new(config)?,
        })
    }

    fn user_prompt(request: &SummaryRequest) -> String {
        let mut prompt = String::from("Conversation, oldest message first:\n");
        for (i, message) in request.messages.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, message));
        }
        if let Some(max_length) = request.max_length {
            prompt.push_str(&format!(
                "\nKeep the summary under {} characters.",
                max_length
            ));
        }
        prompt
    }

    /// Summarize a conversation. Failures come back inside the response
    /// envelope.
    pub async fn summarize(&self, request: &SummaryRequest) -> ToolResponse<ConversationSummary> {
        if request.messages.is_empty() {
            return ToolResponse::failure("nothing to summarize");
        }
        match self.try_summarize(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("conversation summarization failed: {}", e);
                ToolResponse::failure(e.to_string())
            }
        }
    }

    async fn try_summarize(
        &self,
        request: &SummaryRequest,
    ) -> Result<ToolResponse<ConversationSummary>, AiError> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::user_prompt(request)),
        ];
        let completion = self.client.complete(&messages).await?;
        let summary: ConversationSummary = parse_json_reply(&completion.content)?;
        Ok(ToolResponse::success(summary, completion.usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_numbers_messages() {
        let request = SummaryRequest {
            messages: vec!["first".to_string(), "second".to_string()],
            max_length: Some(200),
        };

        let prompt = ConversationSummarizer::user_prompt(&request);
        assert!(prompt.contains("1. first"));
        assert!(prompt.contains("2. second"));
        assert!(prompt.contains("200"));
    }

    #[tokio::test]
    async fn test_empty_conversation_fails_without_io() {
        let summarizer = ConversationSummarizer::new(ServiceConfig {
            api_key: "key".to_string(),
            ..Default::default()
        })
        .unwrap();

        let response = summarizer
            .summarize(&SummaryRequest {
                messages: vec![],
                max_length: None,
            })
            .await;
        assert!(!response.success);
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(ConversationSummarizer::new(ServiceConfig::default()).is_err());
    }
}
