//! Persisted record shapes.

use nostr_core::Event;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in milliseconds.
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A cached profile, keyed by pubkey. Later writes overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    /// Owner pubkey (hex)
    pub pubkey: String,
    /// Profile metadata as published (kind 0 content)
    pub profile: serde_json::Value,
    /// Unix milliseconds of the last write
    pub last_updated: u64,
}

/// A cached event with relay provenance, keyed by event id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// The event itself
    pub event: Event,
    /// Relay the cached copy came from
    pub relay_url: String,
    /// Unix milliseconds of local receipt
    pub received_at: u64,
}
