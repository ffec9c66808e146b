//! AI content tools for Relay16.
//!
//! This crate is the adapter boundary between the Nostr core and AI
//! services: the core submits content and gets a structured result back,
//! nothing more. It provides:
//! - The request/response envelope contract ([`ToolResponse`], token usage)
//! - A chat-completion service client ([`ServiceClient`])
//! - Three content tools: [`PostAssistant`], [`ContentModerator`],
//!   [`ConversationSummarizer`]
//!
//! Service replies are parsed strictly: either the full expected JSON shape
//! comes back, or the envelope carries an error. Tools are plain constructed
//! instances — configure, use, drop; no process-wide singletons.

mod assistant;
mod client;
mod moderator;
mod summarizer;
mod types;

pub use assistant::PostAssistant;
pub use client::{ChatMessage, Completion, ServiceClient, parse_json_reply};
pub use moderator::ContentModerator;
pub use summarizer::ConversationSummarizer;
pub use types::{
    AiError, AssistantRequest, ConversationSummary, ModerationResult, Sentiment, ServiceConfig,
    Strictness, SuggestedAction, SummaryRequest, TokenUsage, Tone, ToolResponse,
    WritingAssistance,
};
