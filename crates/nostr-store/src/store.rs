//! The storage contract.
//!
//! An async key-value interface over four logical partitions — keys,
//! profiles, events, settings — each keyed by a string identifier. Only
//! [`EncryptedKeyRecord`]s cross this boundary: plaintext private keys never
//! reach the storage layer.
//!
//! Implementations initialize lazily on first use; concurrent callers must
//! await the first initialization rather than starting their own.
//! Lifecycle is explicit: construct, use, [`close`](Storage::close).
//! Instances are independent — there is no process-wide store.

use async_trait::async_trait;
use nostr_core::{EncryptedKeyRecord, Event};

use crate::error::Result;
use crate::records::{StoredEvent, StoredProfile};

/// Async storage over the four Relay16 partitions.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store an encrypted key record under a stable id (upsert).
    async fn store_keys(&self, key_id: &str, record: &EncryptedKeyRecord) -> Result<()>;

    /// Fetch an encrypted key record.
    async fn get_keys(&self, key_id: &str) -> Result<Option<EncryptedKeyRecord>>;

    /// Delete an encrypted key record. Deleting a missing id is a no-op.
    async fn delete_keys(&self, key_id: &str) -> Result<()>;

    /// List all stored key ids.
    async fn list_key_ids(&self) -> Result<Vec<String>>;

    /// Cache a profile under its pubkey (upsert, last write wins).
    async fn store_profile(&self, pubkey: &str, profile: serde_json::Value) -> Result<()>;

    /// Fetch a cached profile.
    async fn get_profile(&self, pubkey: &str) -> Result<Option<StoredProfile>>;

    /// Cache an event under its id with relay provenance (upsert).
    async fn store_event(&self, event: &Event, relay_url: &str) -> Result<()>;

    /// Fetch a cached event.
    async fn get_event(&self, event_id: &str) -> Result<Option<StoredEvent>>;

    /// Store a setting value (upsert).
    async fn store_setting(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Fetch a setting value.
    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Empty all four partitions. Used for logout and data reset.
    async fn clear_all(&self) -> Result<()>;

    /// Flush and mark the store closed; subsequent operations fail with
    /// [`crate::StoreError::Closed`].
    async fn close(&self) -> Result<()>;
}
