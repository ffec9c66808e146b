//! Local storage for Relay16.
//!
//! This crate provides:
//! - The [`Storage`] contract: an async key-value interface over four
//!   partitions (encrypted keys, profiles, events, settings)
//! - [`SledStore`]: a durable embedded backend with lazy, race-free
//!   initialization
//! - [`MemoryStore`]: a non-durable fallback with the same contract
//!
//! Private keys only enter this layer as [`nostr_core::EncryptedKeyRecord`]s;
//! encryption and decryption happen in `nostr-core` before and after
//! storage.

mod error;
mod memory;
mod records;
mod sled_store;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use records::{StoredEvent, StoredProfile};
pub use sled_store::SledStore;
pub use store::Storage;
