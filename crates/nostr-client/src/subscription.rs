//! Subscription bookkeeping and channel delivery types.
//!
//! A logical subscription fans out across several relays. Delivery to the
//! consumer is an explicit message-passing channel: the manager pushes
//! [`SubscriptionMessage`]s into it, the consumer pulls. Closing the channel
//! (dropping the receiver or unsubscribing) is the cancellation signal.

use nostr_core::Event;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::message::Filter;

/// Generate a unique subscription ID.
pub fn generate_subscription_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

/// Current unix time in milliseconds, for receipt stamping.
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// What a subscription should ask the relays for.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionConfig {
    /// Filters sent with the REQ
    pub filters: Vec<Filter>,
    /// Explicit relay fan-out; current read relays when `None`
    pub relay_urls: Option<Vec<String>>,
}

/// An event as delivered to a subscriber, stamped with local provenance.
///
/// The same event id may be delivered once per relay that returned it;
/// deduplication is the consumer's job (see `nostr_core::deduplicate_events`)
/// so that per-relay provenance survives until the consumer chooses to
/// collapse it.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    /// The event as received
    pub event: Event,
    /// Relay that delivered this copy
    pub relay_url: String,
    /// Local receipt timestamp, unix milliseconds
    pub received_at: u64,
    /// Result of id + signature verification at receipt time
    pub verified: bool,
}

/// Messages delivered on a subscription channel.
#[derive(Debug, Clone)]
pub enum SubscriptionMessage {
    /// An event from one of the subscribed relays
    Event(IncomingEvent),
    /// Every relay in the fan-out has finished its stored-event backfill.
    /// Emitted at most once; live events keep flowing afterwards.
    EndOfStored,
}

/// Tracks which relays carry a subscription and which have signaled EOSE.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionTracker {
    /// Relays that accepted the REQ
    relays: HashSet<String>,
    /// Relays that have sent EOSE
    eose_relays: HashSet<String>,
    /// Whether every participating relay has sent EOSE
    pub all_eose: bool,
}

impl SubscriptionTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relay to this subscription.
    pub fn add_relay(&mut self, relay_url: impl Into<String>) {
        self.relays.insert(relay_url.into());
        self.update_all_eose();
    }

    /// Remove a relay from this subscription.
    pub fn remove_relay(&mut self, relay_url: &str) {
        self.relays.remove(relay_url);
        self.eose_relays.remove(relay_url);
        self.update_all_eose();
    }

    /// Mark EOSE received from a relay.
    pub fn mark_eose(&mut self, relay_url: impl Into<String>) {
        self.eose_relays.insert(relay_url.into());
        self.update_all_eose();
    }

    fn update_all_eose(&mut self) {
        self.all_eose = !self.relays.is_empty() && self.relays.len() == self.eose_relays.len();
    }

    /// Whether a relay participates in this subscription.
    pub fn has_relay(&self, relay_url: &str) -> bool {
        self.relays.contains(relay_url)
    }

    /// Relays participating in this subscription.
    pub fn relays(&self) -> impl Iterator<Item = &String> {
        self.relays.iter()
    }

    /// Number of participating relays.
    pub fn relay_count(&self) -> usize {
        self.relays.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_subscription_id() {
        let id1 = generate_subscription_id();
        let id2 = generate_subscription_id();
        assert_eq!(id1.len(), 8);
        assert_eq!(id2.len(), 8);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_tracker_add_remove() {
        let mut tracker = SubscriptionTracker::new();
        tracker.add_relay("wss://relay1.example.com");
        tracker.add_relay("wss://relay2.example.com");

        assert_eq!(tracker.relay_count(), 2);
        assert!(tracker.has_relay("wss://relay1.example.com"));

        tracker.remove_relay("wss://relay1.example.com");
        assert_eq!(tracker.relay_count(), 1);
        assert!(!tracker.has_relay("wss://relay1.example.com"));
    }

    #[test]
    fn test_tracker_eose_aggregation() {
        let mut tracker = SubscriptionTracker::new();
        tracker.add_relay("wss://relay1.example.com");
        tracker.add_relay("wss://relay2.example.com");
        assert!(!tracker.all_eose);

        tracker.mark_eose("wss://relay1.example.com");
        assert!(!tracker.all_eose);

        tracker.mark_eose("wss://relay2.example.com");
        assert!(tracker.all_eose);
    }

    #[test]
    fn test_tracker_empty_never_all_eose() {
        let tracker = SubscriptionTracker::new();
        assert!(!tracker.all_eose);
    }

    #[test]
    fn test_tracker_eose_after_relay_drop() {
        let mut tracker = SubscriptionTracker::new();
        tracker.add_relay("wss://relay1.example.com");
        tracker.add_relay("wss://relay2.example.com");
        tracker.mark_eose("wss://relay1.example.com");
        assert!(!tracker.all_eose);

        // the laggard drops out; the remaining relay has already finished
        tracker.remove_relay("wss://relay2.example.com");
        assert!(tracker.all_eose);
    }
}
