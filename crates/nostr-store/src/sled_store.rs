//! Durable storage backed by sled.
//!
//! One sled database with four named trees, one per partition. The database
//! is opened lazily on the first operation; `OnceCell` guarantees concurrent
//! first callers await a single initialization instead of racing into two.

use async_trait::async_trait;
use nostr_core::{EncryptedKeyRecord, Event};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::records::{StoredEvent, StoredProfile, unix_millis};
use crate::store::Storage;

const TREE_KEYS: &str = "keys";
const TREE_PROFILES: &str = "profiles";
const TREE_EVENTS: &str = "events";
const TREE_SETTINGS: &str = "settings";

/// sled-backed store. Construction is cheap; the database is opened on
/// first use.
pub struct SledStore {
    path: PathBuf,
    db: OnceCell<sled::Db>,
    closed: AtomicBool,
}

impl SledStore {
    /// Create a store rooted at `path` (a directory; created on first use).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: OnceCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    async fn db(&self) -> Result<&sled::Db> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        self.db
            .get_or_try_init(|| async {
                debug!("opening sled database at {}", self.path.display());
                sled::open(&self.path).map_err(StoreError::from)
            })
            .await
    }

    async fn tree(&self, name: &str) -> Result<sled::Tree> {
        Ok(self.db().await?.open_tree(name)?)
    }

    async fn put<T: serde::Serialize>(&self, tree: &str, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.tree(tree).await?.insert(key, bytes)?;
        Ok(())
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        tree: &str,
        key: &str,
    ) -> Result<Option<T>> {
        let Some(bytes) = self.tree(tree).await?.get(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[async_trait]
impl Storage for SledStore {
    async fn store_keys(&self, key_id: &str, record: &EncryptedKeyRecord) -> Result<()> {
        self.put(TREE_KEYS, key_id, record).await
    }

    async fn get_keys(&self, key_id: &str) -> Result<Option<EncryptedKeyRecord>> {
        self.get(TREE_KEYS, key_id).await
    }

    async fn delete_keys(&self, key_id: &str) -> Result<()> {
        self.tree(TREE_KEYS).await?.remove(key_id)?;
        Ok(())
    }

    async fn list_key_ids(&self) -> Result<Vec<String>> {
        let tree = self.tree(TREE_KEYS).await?;
        let mut ids = Vec::new();
        for entry in tree.iter() {
            let (key, _value) = entry?;
            ids.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(ids)
    }

    async fn store_profile(&self, pubkey: &str, profile: serde_json::Value) -> Result<()> {
        let record = StoredProfile {
            pubkey: pubkey.to_string(),
            profile,
            last_updated: unix_millis(),
        };
        self.put(TREE_PROFILES, pubkey, &record).await
    }

    async fn get_profile(&self, pubkey: &str) -> Result<Option<StoredProfile>> {
        self.get(TREE_PROFILES, pubkey).await
    }

    async fn store_event(&self, event: &Event, relay_url: &str) -> Result<()> {
        let record = StoredEvent {
            event: event.clone(),
            relay_url: relay_url.to_string(),
            received_at: unix_millis(),
        };
        self.put(TREE_EVENTS, &event.id, &record).await
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<StoredEvent>> {
        self.get(TREE_EVENTS, event_id).await
    }

    async fn store_setting(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.put(TREE_SETTINGS, key, &value).await
    }

    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.get(TREE_SETTINGS, key).await
    }

    /// Clears the four trees one after another, then flushes. sled has no
    /// multi-tree transaction for this, so an interruption mid-way can leave
    /// some partitions cleared and others not — a known consistency gap of
    /// this backend.
    async fn clear_all(&self) -> Result<()> {
        for name in [TREE_KEYS, TREE_PROFILES, TREE_EVENTS, TREE_SETTINGS] {
            self.tree(name).await?.clear()?;
        }
        self.db().await?.flush_async().await?;
        info!("cleared all store partitions");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(db) = self.db.get() {
            db.flush_async().await?;
        }
        debug!("store at {} closed", self.path.display());
        Ok(())
    }
}
