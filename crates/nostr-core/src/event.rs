//! Core Nostr event structure and operations:
//! - Event structure (id, pubkey, created_at, kind, tags, content, sig)
//! - Canonical serialization for hashing
//! - Event signing with Schnorr signatures
//! - Event verification (id recomputation plus signature check)

use bitcoin::hashes::{Hash, sha256};
use bitcoin::key::Secp256k1;
use bitcoin::secp256k1::{Keypair, Message, SecretKey, XOnlyPublicKey, schnorr};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::keys::parse_private_key;

/// Errors that can occur while building or serializing events.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// A signed Nostr event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// 32-bytes lowercase hex-encoded sha256 of the serialized event data
    pub id: String,
    /// 32-bytes lowercase hex-encoded public key of the event creator
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind (integer between 0 and 65535)
    pub kind: u16,
    /// Array of arrays of strings (tags)
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    pub content: String,
    /// 64-bytes lowercase hex signature
    pub sig: String,
}

/// An unsigned event (before signing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    /// 32-bytes lowercase hex-encoded public key of the event creator
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind
    pub kind: u16,
    /// Array of arrays of strings (tags)
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    pub content: String,
}

/// A template for creating events (without pubkey, which comes from the
/// signing key).
///
/// `created_at` is optional; [`create_event`] fills in the current unix time
/// when it is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTemplate {
    /// Event kind
    pub kind: u16,
    /// Arbitrary string content
    pub content: String,
    /// Array of arrays of strings (tags)
    pub tags: Vec<Vec<String>>,
    /// Unix timestamp in seconds, current time when `None`
    pub created_at: Option<u64>,
}

// Standard event kinds produced by the typed constructors.
pub const KIND_METADATA: u16 = 0;
pub const KIND_TEXT_NOTE: u16 = 1;
pub const KIND_CONTACTS: u16 = 3;
pub const KIND_DELETE: u16 = 5;
pub const KIND_REPOST: u16 = 6;
pub const KIND_REACTION: u16 = 7;

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Serialize an unsigned event for hashing.
///
/// Format: `[0, pubkey, created_at, kind, tags, content]` with no extra
/// whitespace. Any deviation produces an incompatible event id.
pub fn serialize_event(event: &UnsignedEvent) -> Result<String, EventError> {
    if !validate_unsigned_event(event) {
        return Err(EventError::InvalidEvent(
            "can't serialize event with wrong or missing properties".to_string(),
        ));
    }

    serde_json::to_string(&(
        0,
        &event.pubkey,
        event.created_at,
        event.kind,
        &event.tags,
        &event.content,
    ))
    .map_err(|e| EventError::Serialization(e.to_string()))
}

/// Get the event hash (id) from an unsigned event.
pub fn get_event_hash(event: &UnsignedEvent) -> Result<String, EventError> {
    let serialized = serialize_event(event)?;
    let hash = sha256::Hash::hash(serialized.as_bytes());
    Ok(hex::encode(hash.as_byte_array()))
}

/// Validate an unsigned event structure (pubkey shape only; tags are
/// permissive per the reference implementations).
pub fn validate_unsigned_event(event: &UnsignedEvent) -> bool {
    if event.pubkey.len() != 64 {
        return false;
    }
    if !event.pubkey.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    if event.pubkey != event.pubkey.to_lowercase() {
        return false;
    }
    true
}

/// Validate a signed event structure (not including signature verification).
pub fn validate_event_structure(event: &Event) -> bool {
    if event.id.len() != 64 || !event.id.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    if event.pubkey.len() != 64 || !event.pubkey.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    if event.pubkey != event.pubkey.to_lowercase() {
        return false;
    }
    if event.sig.len() != 128 || !event.sig.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    true
}

/// Create and sign an event from a template.
///
/// Fills `created_at` with the current unix time if absent, derives the
/// pubkey from `private_key` (64 hex chars), computes the id over the
/// canonical tuple, and signs the id with a Schnorr signature. Signing is a
/// pure function of (id, private key).
pub fn create_event(template: &EventTemplate, private_key: &str) -> Result<Event, EventError> {
    let secret = parse_private_key(private_key).map_err(|e| EventError::InvalidKey(e.to_string()))?;

    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&secret).map_err(|e| EventError::InvalidKey(e.to_string()))?;
    let (xonly_pk, _parity) = sk.x_only_public_key(&secp);
    let pubkey = hex::encode(xonly_pk.serialize());

    let created_at = template.created_at.unwrap_or_else(unix_now);

    let unsigned = UnsignedEvent {
        pubkey: pubkey.clone(),
        created_at,
        kind: template.kind,
        tags: template.tags.clone(),
        content: template.content.clone(),
    };

    let id = get_event_hash(&unsigned)?;

    let id_bytes =
        hex::decode(&id).map_err(|e| EventError::Signing(format!("invalid id hex: {}", e)))?;
    let message = Message::from_digest_slice(&id_bytes)
        .map_err(|e| EventError::Signing(format!("invalid message: {}", e)))?;

    let keypair = Keypair::from_secret_key(&secp, &sk);
    let sig = secp.sign_schnorr_no_aux_rand(&message, &keypair);

    Ok(Event {
        id,
        pubkey,
        created_at,
        kind: template.kind,
        tags: template.tags.clone(),
        content: template.content.clone(),
        sig: hex::encode(sig.serialize()),
    })
}

/// Verify an event's id and signature.
///
/// Recomputes the expected id from the event's fields and checks it matches
/// `event.id`, then verifies the signature against `pubkey`. An event with a
/// mismatched id is invalid regardless of signature validity. Verification
/// is a predicate: it returns `false` on any failure, it never errors.
pub fn verify_event_signature(event: &Event) -> bool {
    if !validate_event_structure(event) {
        return false;
    }

    let unsigned = UnsignedEvent {
        pubkey: event.pubkey.clone(),
        created_at: event.created_at,
        kind: event.kind,
        tags: event.tags.clone(),
        content: event.content.clone(),
    };

    let computed_id = match get_event_hash(&unsigned) {
        Ok(id) => id,
        Err(_) => return false,
    };
    if computed_id != event.id {
        return false;
    }

    let secp = Secp256k1::verification_only();

    let Ok(id_bytes) = hex::decode(&event.id) else {
        return false;
    };
    let Ok(message) = Message::from_digest_slice(&id_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(&event.sig) else {
        return false;
    };
    let Ok(sig) = schnorr::Signature::from_slice(&sig_bytes) else {
        return false;
    };
    let Ok(pubkey_bytes) = hex::decode(&event.pubkey) else {
        return false;
    };
    let Ok(pubkey) = XOnlyPublicKey::from_slice(&pubkey_bytes) else {
        return false;
    };

    secp.verify_schnorr(&sig, &message, &pubkey).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keypair;

    // Fixed key so serialization and hashes are reproducible across runs
    const TEST_PRIVATE_KEY: &str =
        "d217c1ff2f8a65c3e3a1740db3b9f58b8c848bb45e26d00ed4714e4a0f4ceecf";

    fn test_pubkey() -> String {
        crate::keys::public_key_from_private(TEST_PRIVATE_KEY).unwrap()
    }

    // =========================================================================
    // serialize_event / get_event_hash
    // =========================================================================

    #[test]
    fn test_serialize_event_canonical_form() {
        let public_key = test_pubkey();
        let unsigned = UnsignedEvent {
            pubkey: public_key.clone(),
            created_at: 1617932115,
            kind: KIND_TEXT_NOTE,
            tags: vec![],
            content: "Hello, world!".to_string(),
        };

        let serialized = serialize_event(&unsigned).unwrap();
        let expected = format!("[0,\"{}\",1617932115,1,[],\"Hello, world!\"]", public_key);
        assert_eq!(serialized, expected);
    }

    #[test]
    fn test_serialize_event_invalid_pubkey() {
        let unsigned = UnsignedEvent {
            pubkey: "invalid".to_string(),
            created_at: 1617932115,
            kind: KIND_TEXT_NOTE,
            tags: vec![],
            content: "Hello, world!".to_string(),
        };

        assert!(serialize_event(&unsigned).is_err());
    }

    #[test]
    fn test_event_hash_deterministic() {
        let unsigned = UnsignedEvent {
            pubkey: test_pubkey(),
            created_at: 1617932115,
            kind: KIND_TEXT_NOTE,
            tags: vec![],
            content: "Hello, world!".to_string(),
        };

        let hash1 = get_event_hash(&unsigned).unwrap();
        let hash2 = get_event_hash(&unsigned).unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    // =========================================================================
    // create_event
    // =========================================================================

    #[test]
    fn test_create_event_produces_signed_event() {
        let template = EventTemplate {
            kind: KIND_TEXT_NOTE,
            content: "Hello, world!".to_string(),
            tags: vec![],
            created_at: Some(1617932115),
        };

        let event = create_event(&template, TEST_PRIVATE_KEY).unwrap();

        assert_eq!(event.kind, template.kind);
        assert_eq!(event.content, template.content);
        assert_eq!(event.created_at, 1617932115);
        assert_eq!(event.pubkey, test_pubkey());
        assert_eq!(event.id.len(), 64);
        assert_eq!(event.sig.len(), 128);
        assert!(verify_event_signature(&event));
    }

    #[test]
    fn test_create_event_fills_created_at() {
        let before = unix_now();
        let template = EventTemplate {
            kind: KIND_TEXT_NOTE,
            content: "now".to_string(),
            ..Default::default()
        };

        let event = create_event(&template, TEST_PRIVATE_KEY).unwrap();
        let after = unix_now();

        assert!(event.created_at >= before && event.created_at <= after);
    }

    #[test]
    fn test_create_event_rejects_bad_key() {
        let template = EventTemplate {
            kind: KIND_TEXT_NOTE,
            content: "x".to_string(),
            ..Default::default()
        };

        assert!(create_event(&template, "not-a-key").is_err());
        assert!(create_event(&template, &"0".repeat(64)).is_err());
    }

    // =========================================================================
    // verify_event_signature
    // =========================================================================

    fn signed_event() -> Event {
        create_event(
            &EventTemplate {
                kind: KIND_TEXT_NOTE,
                content: "Hello, world!".to_string(),
                tags: vec![vec!["t".to_string(), "rust".to_string()]],
                created_at: Some(1617932115),
            },
            TEST_PRIVATE_KEY,
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_event() {
        assert!(verify_event_signature(&signed_event()));
    }

    #[test]
    fn test_verify_rejects_tampered_content() {
        let mut event = signed_event();
        event.content = "Goodbye, world!".to_string();
        assert!(!verify_event_signature(&event));
    }

    #[test]
    fn test_verify_rejects_tampered_tags() {
        let mut event = signed_event();
        event.tags.push(vec!["e".to_string(), "a".repeat(64)]);
        assert!(!verify_event_signature(&event));
    }

    #[test]
    fn test_verify_rejects_tampered_created_at() {
        let mut event = signed_event();
        event.created_at += 1;
        assert!(!verify_event_signature(&event));
    }

    #[test]
    fn test_verify_rejects_tampered_kind() {
        let mut event = signed_event();
        event.kind = KIND_REACTION;
        assert!(!verify_event_signature(&event));
    }

    #[test]
    fn test_verify_rejects_wrong_pubkey() {
        let mut event = signed_event();
        event.pubkey = generate_keypair().public_key;
        assert!(!verify_event_signature(&event));
    }

    #[test]
    fn test_verify_rejects_tampered_sig() {
        let mut event = signed_event();
        let mut sig: Vec<char> = event.sig.chars().collect();
        sig[0] = if sig[0] == '6' { '7' } else { '6' };
        event.sig = sig.into_iter().collect();
        assert!(!verify_event_signature(&event));
    }

    #[test]
    fn test_verify_rejects_mismatched_id_even_with_valid_sig() {
        // id and sig checks are independent; a bad id alone must fail
        let mut event = signed_event();
        let mut id: Vec<char> = event.id.chars().collect();
        id[0] = if id[0] == '6' { '7' } else { '6' };
        event.id = id.into_iter().collect();
        assert!(!verify_event_signature(&event));
    }

    // =========================================================================
    // JSON wire shape
    // =========================================================================

    #[test]
    fn test_event_roundtrip_json() {
        let event = signed_event();
        let json = serde_json::to_string(&event).unwrap();
        let event2: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, event2);
        assert!(verify_event_signature(&event2));
    }

    #[test]
    fn test_event_wire_field_names() {
        let event = signed_event();
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        for field in ["id", "pubkey", "created_at", "kind", "tags", "content", "sig"] {
            assert!(value.get(field).is_some(), "missing wire field {}", field);
        }
    }

    #[test]
    fn test_event_with_special_characters_in_content() {
        let template = EventTemplate {
            kind: KIND_TEXT_NOTE,
            content: "Hello\nWorld\t\"quotes\" and \\backslash".to_string(),
            tags: vec![],
            created_at: Some(1617932115),
        };

        let event = create_event(&template, TEST_PRIVATE_KEY).unwrap();
        assert!(verify_event_signature(&event));
    }

    #[test]
    fn test_event_with_unicode_content() {
        let template = EventTemplate {
            kind: KIND_TEXT_NOTE,
            content: "Hello 世界 🌍 مرحبا".to_string(),
            tags: vec![],
            created_at: Some(1617932115),
        };

        let event = create_event(&template, TEST_PRIVATE_KEY).unwrap();
        assert!(verify_event_signature(&event));
    }
}
