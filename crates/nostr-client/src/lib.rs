//! Relay connection manager for Relay16.
//!
//! This crate provides:
//! - WebSocket connections to Nostr relays with a small per-relay state
//!   machine (connecting, connected, disconnected, error)
//! - Relay protocol message framing (EVENT/REQ/CLOSE out, EVENT/OK/EOSE/
//!   CLOSED/NOTICE in)
//! - Subscription fan-out across relays with channel-based delivery and
//!   aggregated end-of-stored-events
//! - Publish fan-out with independent per-relay outcomes
//! - A reusable retry policy applied at the connection boundary
//!
//! # Example
//!
//! ```rust,no_run
//! use nostr_client::{Filter, ManagerConfig, RelayManager, RelayOptions,
//!     SubscriptionConfig, SubscriptionMessage};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = RelayManager::new(ManagerConfig::default());
//!     manager
//!         .add_relay("wss://relay.damus.io", RelayOptions::default())
//!         .await
//!         .unwrap();
//!
//!     let mut events = manager
//!         .subscribe(
//!             "feed",
//!             SubscriptionConfig {
//!                 filters: vec![Filter::new().kinds(vec![1]).limit(10)],
//!                 relay_urls: None,
//!             },
//!         )
//!         .await
//!         .unwrap();
//!
//!     while let Some(msg) = events.recv().await {
//!         match msg {
//!             SubscriptionMessage::Event(incoming) => {
//!                 println!("event {} via {}", incoming.event.id, incoming.relay_url);
//!             }
//!             SubscriptionMessage::EndOfStored => break,
//!         }
//!     }
//!
//!     manager.close().await;
//! }
//! ```

mod connection;
mod error;
mod manager;
mod message;
mod retry;
mod subscription;

pub use connection::{ConnectionConfig, RelayDescriptor, RelayOptions, RelayStatus};
pub use error::{ClientError, Result};
pub use manager::{ManagerConfig, PublishOutcome, RelayManager};
pub use message::{ClientMessage, Filter, MessageError, RelayMessage};
pub use retry::RetryPolicy;
pub use subscription::{
    IncomingEvent, SubscriptionConfig, SubscriptionMessage, SubscriptionTracker,
    generate_subscription_id,
};

/// Default relays for Relay16.
pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.nostr.band",
    "wss://eden.nostr.land",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_relays() {
        assert!(!DEFAULT_RELAYS.is_empty());
        for relay in DEFAULT_RELAYS {
            assert!(relay.starts_with("wss://"));
        }
    }
}
