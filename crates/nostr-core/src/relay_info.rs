//! Relay information document.
//!
//! Relays self-describe over their HTTP endpoint when asked with
//! `Accept: application/nostr+json`. Every field is optional; absent fields
//! mean unknown. Fetching lives in the client crate — these are just the
//! document types.

use serde::{Deserialize, Serialize};

/// Accept header value for requesting a relay information document.
pub const RELAY_INFO_ACCEPT_HEADER: &str = "application/nostr+json";

/// A relay's self-reported capability document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayInformation {
    /// Relay name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Administrative contact pubkey (hex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,

    /// Administrative contact (URI: mailto:, https:, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// List of supported NIP numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_nips: Option<Vec<u16>>,

    /// Relay software URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,

    /// Software version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Server limitations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitation: Option<RelayLimitation>,

    /// Payments URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments_url: Option<String>,
}

/// Self-reported server limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayLimitation {
    /// Maximum message length in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_message_length: Option<usize>,

    /// Maximum active subscriptions per connection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_subscriptions: Option<usize>,

    /// Maximum limit value in filters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<usize>,

    /// Maximum event tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_event_tags: Option<usize>,

    /// Maximum content length (unicode characters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_content_length: Option<usize>,

    /// Whether authentication is required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_required: Option<bool>,

    /// Whether payment is required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_required: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_document() {
        let json = r#"{"name":"test relay","supported_nips":[1,11]}"#;
        let info: RelayInformation = serde_json::from_str(json).unwrap();
        assert_eq!(info.name.as_deref(), Some("test relay"));
        assert_eq!(info.supported_nips, Some(vec![1, 11]));
        assert!(info.description.is_none());
        assert!(info.limitation.is_none());
    }

    #[test]
    fn test_deserialize_empty_document() {
        let info: RelayInformation = serde_json::from_str("{}").unwrap();
        assert_eq!(info, RelayInformation::default());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{"name":"r","icon":"https://x.example/i.png","relay_countries":["US"]}"#;
        let info: RelayInformation = serde_json::from_str(json).unwrap();
        assert_eq!(info.name.as_deref(), Some("r"));
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let info = RelayInformation {
            name: Some("r".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"name":"r"}"#);
    }

    #[test]
    fn test_limitation_fields() {
        let json = r#"{"limitation":{"max_message_length":65536,"auth_required":false}}"#;
        let info: RelayInformation = serde_json::from_str(json).unwrap();
        let limitation = info.limitation.unwrap();
        assert_eq!(limitation.max_message_length, Some(65536));
        assert_eq!(limitation.auth_required, Some(false));
        assert!(limitation.max_subscriptions.is_none());
    }
}
