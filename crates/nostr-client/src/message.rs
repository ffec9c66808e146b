//! Relay protocol messages.
//!
//! Wire framing between client and relay:
//! - Client to relay: `["EVENT", event]`, `["REQ", sub_id, filter...]`,
//!   `["CLOSE", sub_id]`
//! - Relay to client: `["EVENT", sub_id, event]`, `["OK", event_id, bool,
//!   message]`, `["EOSE", sub_id]`, `["CLOSED", sub_id, message]`,
//!   `["NOTICE", message]`
//!
//! Parsing is strict: a frame either yields a fully-validated
//! [`RelayMessage`] or a [`MessageError`], never a partially-filled value.

use nostr_core::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when parsing relay messages.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid message format: {0}")]
    InvalidFormat(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Messages sent from client to relay.
#[derive(Debug, Clone)]
pub enum ClientMessage {
    /// Publish an event: `["EVENT", <event>]`
    Event(Event),

    /// Open a subscription: `["REQ", <sub_id>, <filter>...]`
    Req {
        subscription_id: String,
        filters: Vec<Filter>,
    },

    /// Close a subscription: `["CLOSE", <sub_id>]`
    Close { subscription_id: String },
}

impl ClientMessage {
    /// Serialize to a JSON array for sending to a relay.
    pub fn to_json(&self) -> Result<String, MessageError> {
        let value = match self {
            ClientMessage::Event(event) => serde_json::json!(["EVENT", event]),
            ClientMessage::Req {
                subscription_id,
                filters,
            } => {
                let mut arr: Vec<Value> = vec![
                    Value::String("REQ".to_string()),
                    Value::String(subscription_id.clone()),
                ];
                for filter in filters {
                    arr.push(serde_json::to_value(filter)?);
                }
                Value::Array(arr)
            }
            ClientMessage::Close { subscription_id } => {
                serde_json::json!(["CLOSE", subscription_id])
            }
        };
        Ok(value.to_string())
    }
}

/// Messages sent from relay to client.
#[derive(Debug, Clone)]
pub enum RelayMessage {
    /// Event matching a subscription
    Event {
        subscription_id: String,
        event: Event,
    },

    /// Command result for a published event
    Ok {
        event_id: String,
        success: bool,
        message: String,
    },

    /// End of stored events for a subscription
    Eose { subscription_id: String },

    /// Subscription closed by the relay
    Closed {
        subscription_id: String,
        message: String,
    },

    /// Human-readable notice
    Notice { message: String },
}

fn field_str(arr: &[Value], index: usize, name: &str) -> Result<String, MessageError> {
    arr.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MessageError::InvalidFormat(format!("{} must be a string", name)))
}

impl RelayMessage {
    /// Parse a JSON frame from the relay.
    pub fn from_json(json: &str) -> Result<Self, MessageError> {
        let arr: Vec<Value> =
            serde_json::from_str(json).map_err(|e| MessageError::InvalidFormat(e.to_string()))?;

        if arr.is_empty() {
            return Err(MessageError::InvalidFormat("empty array".to_string()));
        }

        let msg_type = arr[0]
            .as_str()
            .ok_or_else(|| MessageError::InvalidFormat("first element not a string".to_string()))?;

        match msg_type {
            "EVENT" => {
                if arr.len() < 3 {
                    return Err(MessageError::MissingField(
                        "event or subscription_id".to_string(),
                    ));
                }
                let subscription_id = field_str(&arr, 1, "subscription_id")?;
                let event: Event = serde_json::from_value(arr[2].clone())?;
                Ok(RelayMessage::Event {
                    subscription_id,
                    event,
                })
            }
            "OK" => {
                if arr.len() < 4 {
                    return Err(MessageError::MissingField("OK fields".to_string()));
                }
                let event_id = field_str(&arr, 1, "event_id")?;
                let success = arr[2].as_bool().ok_or_else(|| {
                    MessageError::InvalidFormat("success not a boolean".to_string())
                })?;
                let message = arr[3].as_str().unwrap_or("").to_string();
                Ok(RelayMessage::Ok {
                    event_id,
                    success,
                    message,
                })
            }
            "EOSE" => {
                if arr.len() < 2 {
                    return Err(MessageError::MissingField("subscription_id".to_string()));
                }
                Ok(RelayMessage::Eose {
                    subscription_id: field_str(&arr, 1, "subscription_id")?,
                })
            }
            "CLOSED" => {
                if arr.len() < 3 {
                    return Err(MessageError::MissingField("CLOSED fields".to_string()));
                }
                let subscription_id = field_str(&arr, 1, "subscription_id")?;
                let message = arr[2].as_str().unwrap_or("").to_string();
                Ok(RelayMessage::Closed {
                    subscription_id,
                    message,
                })
            }
            "NOTICE" => {
                if arr.len() < 2 {
                    return Err(MessageError::MissingField("message".to_string()));
                }
                Ok(RelayMessage::Notice {
                    message: field_str(&arr, 1, "message")?,
                })
            }
            _ => Err(MessageError::UnknownType(msg_type.to_string())),
        }
    }
}

/// Filter for subscription requests.
///
/// Constrains matching events by id, author, kind, time range, limit, and
/// `#`-prefixed tag queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    /// Event IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,

    /// Authors (pubkeys)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    /// Event kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u16>>,

    /// Events since timestamp (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,

    /// Events until timestamp (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,

    /// Maximum number of events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Generic tag queries; key is the tag letter prefixed with `#`
    #[serde(flatten, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub tags: std::collections::HashMap<String, Vec<String>>,
}

impl Filter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by event IDs.
    pub fn ids(mut self, ids: Vec<String>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Filter by authors.
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.authors = Some(authors);
        self
    }

    /// Filter by kinds.
    pub fn kinds(mut self, kinds: Vec<u16>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    /// Filter by events since timestamp.
    pub fn since(mut self, timestamp: u64) -> Self {
        self.since = Some(timestamp);
        self
    }

    /// Filter by events until timestamp.
    pub fn until(mut self, timestamp: u64) -> Self {
        self.until = Some(timestamp);
        self
    }

    /// Limit number of results.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Add a tag filter. The key should be the tag letter (e.g. "e", "p").
    pub fn tag(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.tags.insert(format!("#{}", key.into()), values);
        self
    }

    /// Filter by `#e` (event reference) tags.
    pub fn event_refs(self, event_ids: Vec<String>) -> Self {
        self.tag("e", event_ids)
    }

    /// Filter by `#p` (pubkey reference) tags.
    pub fn pubkey_refs(self, pubkeys: Vec<String>) -> Self {
        self.tag("p", pubkeys)
    }
}
