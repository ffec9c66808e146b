//! Non-durable in-memory store.
//!
//! Implements the same contract as the sled backend over plain maps, for
//! environments without a usable embedded database. Trades durability for
//! availability: everything is lost when the instance drops.

use async_trait::async_trait;
use nostr_core::{EncryptedKeyRecord, Event};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::records::{StoredEvent, StoredProfile, unix_millis};
use crate::store::Storage;

#[derive(Default)]
struct MemoryInner {
    keys: HashMap<String, EncryptedKeyRecord>,
    profiles: HashMap<String, StoredProfile>,
    events: HashMap<String, StoredEvent>,
    settings: HashMap<String, serde_json::Value>,
    closed: bool,
}

impl MemoryInner {
    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

/// In-memory fallback store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn store_keys(&self, key_id: &str, record: &EncryptedKeyRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_open()?;
        inner.keys.insert(key_id.to_string(), record.clone());
        Ok(())
    }

    async fn get_keys(&self, key_id: &str) -> Result<Option<EncryptedKeyRecord>> {
        let inner = self.inner.read().await;
        inner.check_open()?;
        Ok(inner.keys.get(key_id).cloned())
    }

    async fn delete_keys(&self, key_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_open()?;
        inner.keys.remove(key_id);
        Ok(())
    }

    async fn list_key_ids(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        inner.check_open()?;
        Ok(inner.keys.keys().cloned().collect())
    }

    async fn store_profile(&self, pubkey: &str, profile: serde_json::Value) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_open()?;
        inner.profiles.insert(
            pubkey.to_string(),
            StoredProfile {
                pubkey: pubkey.to_string(),
                profile,
                last_updated: unix_millis(),
            },
        );
        Ok(())
    }

    async fn get_profile(&self, pubkey: &str) -> Result<Option<StoredProfile>> {
        let inner = self.inner.read().await;
        inner.check_open()?;
        Ok(inner.profiles.get(pubkey).cloned())
    }

    async fn store_event(&self, event: &Event, relay_url: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_open()?;
        inner.events.insert(
            event.id.clone(),
            StoredEvent {
                event: event.clone(),
                relay_url: relay_url.to_string(),
                received_at: unix_millis(),
            },
        );
        Ok(())
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<StoredEvent>> {
        let inner = self.inner.read().await;
        inner.check_open()?;
        Ok(inner.events.get(event_id).cloned())
    }

    async fn store_setting(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_open()?;
        inner.settings.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let inner = self.inner.read().await;
        inner.check_open()?;
        Ok(inner.settings.get(key).cloned())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_open()?;
        inner.keys.clear();
        inner.profiles.clear();
        inner.events.clear();
        inner.settings.clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.inner.write().await.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_core::{create_text_note, encrypt_private_key, generate_keypair};

    fn key_record() -> EncryptedKeyRecord {
        let keys = generate_keypair();
        encrypt_private_key(&keys.private_key, "password").unwrap()
    }

    #[tokio::test]
    async fn test_keys_roundtrip() {
        let store = MemoryStore::new();
        let record = key_record();

        store.store_keys("primary", &record).await.unwrap();
        assert_eq!(store.get_keys("primary").await.unwrap(), Some(record));
        assert_eq!(store.list_key_ids().await.unwrap(), vec!["primary"]);

        store.delete_keys("primary").await.unwrap();
        assert!(store.get_keys("primary").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_and_event_roundtrip() {
        let store = MemoryStore::new();
        let keys = generate_keypair();
        let event = create_text_note("x", vec![], &keys.private_key).unwrap();

        store
            .store_profile(&keys.public_key, serde_json::json!({"name": "bob"}))
            .await
            .unwrap();
        store.store_event(&event, "wss://r.example.com").await.unwrap();

        let profile = store.get_profile(&keys.public_key).await.unwrap().unwrap();
        assert_eq!(profile.profile["name"], "bob");

        let stored = store.get_event(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.event, event);
        assert_eq!(stored.relay_url, "wss://r.example.com");
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = MemoryStore::new();
        store
            .store_setting("theme", serde_json::json!("light"))
            .await
            .unwrap();
        store
            .store_setting("theme", serde_json::json!("dark"))
            .await
            .unwrap();
        assert_eq!(
            store.get_setting("theme").await.unwrap(),
            Some(serde_json::json!("dark"))
        );
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = MemoryStore::new();
        store.store_keys("k", &key_record()).await.unwrap();
        store
            .store_setting("s", serde_json::json!(true))
            .await
            .unwrap();

        store.clear_all().await.unwrap();
        assert!(store.list_key_ids().await.unwrap().is_empty());
        assert!(store.get_setting("s").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_operations_after_close_fail() {
        let store = MemoryStore::new();
        store.close().await.unwrap();
        assert!(matches!(
            store.get_keys("any").await,
            Err(StoreError::Closed)
        ));
    }
}
