//! Relay connection manager.
//!
//! Maintains a pool of relay connections and fans logical operations out
//! across them:
//! - `subscribe` opens one logical subscription against many relays and
//!   delivers verified, receipt-stamped events over a channel
//! - `publish` sends an event to many relays and collects independent
//!   per-relay outcomes — partial success is success
//! - `fetch_event` is a one-shot first-match query
//!
//! Relay-level failures degrade that relay's status and are otherwise
//! swallowed: a flaky relay contributes nothing, it never fails the whole
//! operation. The only hard precondition error is an empty resolved relay
//! set ([`ClientError::NoRelaysAvailable`]).
//!
//! The connection and subscription maps are owned exclusively by the
//! manager; a single router task dispatches every inbound frame. Managers
//! are independent instances and share nothing — construct, use, `close`.

use nostr_core::{RELAY_INFO_ACCEPT_HEADER, RelayInformation, verify_event_signature};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::connection::{
    ConnectionConfig, IngestMessage, RelayConnection, RelayDescriptor, RelayOptions,
};
use crate::error::{ClientError, Result};
use crate::message::{ClientMessage, Filter, RelayMessage};
use crate::retry::RetryPolicy;
use crate::subscription::{
    IncomingEvent, SubscriptionConfig, SubscriptionMessage, SubscriptionTracker,
    generate_subscription_id, unix_millis,
};

/// Manager tuning.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// WebSocket handshake timeout per relay
    pub connect_timeout: Duration,
    /// How long to wait for a relay's OK after publishing
    pub publish_timeout: Duration,
    /// Overall budget for one-shot queries and relay info fetches
    pub query_timeout: Duration,
    /// Retry policy applied when establishing connections
    pub retry: RetryPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            publish_timeout: Duration::from_secs(10),
            query_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Per-relay result of a publish fan-out.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Relay this outcome belongs to
    pub relay_url: String,
    /// Whether the relay accepted the event
    pub accepted: bool,
    /// Relay-provided message (empty on plain acceptance)
    pub message: String,
}

struct SubscriptionHandle {
    tx: mpsc::UnboundedSender<SubscriptionMessage>,
    tracker: SubscriptionTracker,
    eose_emitted: bool,
}

type PendingPublishes = HashMap<(String, String), oneshot::Sender<(bool, String)>>;

/// A pool of relay connections with subscription and publish fan-out.
pub struct RelayManager {
    config: ManagerConfig,
    relays: Arc<RwLock<HashMap<String, Arc<RelayConnection>>>>,
    subscriptions: Arc<RwLock<HashMap<String, SubscriptionHandle>>>,
    pending_publishes: Arc<Mutex<PendingPublishes>>,
    ingest_tx: mpsc::UnboundedSender<IngestMessage>,
    http: reqwest::Client,
}

impl RelayManager {
    /// Create a manager with the given configuration.
    pub fn new(config: ManagerConfig) -> Self {
        let (ingest_tx, ingest_rx) = mpsc::unbounded_channel();
        let subscriptions: Arc<RwLock<HashMap<String, SubscriptionHandle>>> =
            Arc::new(RwLock::new(HashMap::new()));
        let pending_publishes: Arc<Mutex<PendingPublishes>> =
            Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::router(
            ingest_rx,
            Arc::clone(&subscriptions),
            Arc::clone(&pending_publishes),
        ));

        let http = reqwest::Client::builder()
            .timeout(config.query_timeout)
            .build()
            .unwrap_or_default();

        Self {
            config,
            relays: Arc::new(RwLock::new(HashMap::new())),
            subscriptions,
            pending_publishes,
            ingest_tx,
            http,
        }
    }

    /// Dispatch loop: routes every inbound frame to its subscription channel
    /// or pending publish confirmation. Exits when the last ingest sender is
    /// dropped (manager and all connections gone).
    async fn router(
        mut rx: mpsc::UnboundedReceiver<IngestMessage>,
        subscriptions: Arc<RwLock<HashMap<String, SubscriptionHandle>>>,
        pending_publishes: Arc<Mutex<PendingPublishes>>,
    ) {
        while let Some((relay_url, msg)) = rx.recv().await {
            match msg {
                RelayMessage::Event {
                    subscription_id,
                    event,
                } => {
                    let mut subs = subscriptions.write().await;
                    if let Some(handle) = subs.get(&subscription_id) {
                        let verified = verify_event_signature(&event);
                        let incoming = IncomingEvent {
                            event,
                            relay_url,
                            received_at: unix_millis(),
                            verified,
                        };
                        if handle
                            .tx
                            .send(SubscriptionMessage::Event(incoming))
                            .is_err()
                        {
                            debug!(
                                "subscription {} receiver dropped, removing",
                                subscription_id
                            );
                            subs.remove(&subscription_id);
                        }
                    }
                }
                RelayMessage::Eose { subscription_id } => {
                    let mut subs = subscriptions.write().await;
                    if let Some(handle) = subs.get_mut(&subscription_id) {
                        handle.tracker.mark_eose(&relay_url);
                        Self::maybe_emit_eose(handle);
                    }
                }
                RelayMessage::Ok {
                    event_id,
                    success,
                    message,
                } => {
                    let sender = pending_publishes
                        .lock()
                        .await
                        .remove(&(relay_url, event_id));
                    if let Some(tx) = sender {
                        let _ = tx.send((success, message));
                    }
                }
                RelayMessage::Closed {
                    subscription_id,
                    message,
                } => {
                    warn!(
                        "subscription {} closed by {}: {}",
                        subscription_id, relay_url, message
                    );
                    let mut subs = subscriptions.write().await;
                    if let Some(handle) = subs.get_mut(&subscription_id) {
                        handle.tracker.remove_relay(&relay_url);
                        Self::maybe_emit_eose(handle);
                    }
                }
                RelayMessage::Notice { message } => {
                    warn!("notice from {}: {}", relay_url, message);
                }
            }
        }
    }

    /// EndOfStored fires once per subscription, when every participating
    /// relay has finished its backfill.
    fn maybe_emit_eose(handle: &mut SubscriptionHandle) {
        if handle.tracker.all_eose && !handle.eose_emitted {
            handle.eose_emitted = true;
            let _ = handle.tx.send(SubscriptionMessage::EndOfStored);
        }
    }

    /// Register a relay and attempt to connect it.
    ///
    /// Re-registering a URL replaces the previous descriptor (last
    /// registration wins). Connection failure is recorded on the relay's
    /// status, not returned: the relay simply stays unavailable until the
    /// caller re-adds it.
    pub async fn add_relay(&self, url: &str, options: RelayOptions) -> Result<()> {
        let conn = Arc::new(RelayConnection::new(
            url,
            options,
            ConnectionConfig {
                connect_timeout: self.config.connect_timeout,
            },
        )?);

        info!("adding relay: {}", url);

        let previous = {
            let mut relays = self.relays.write().await;
            relays.insert(url.to_string(), Arc::clone(&conn))
        };
        if let Some(old) = previous {
            old.disconnect().await;
        }

        let connect_result = self
            .config
            .retry
            .run(|| {
                let conn = Arc::clone(&conn);
                let ingest = self.ingest_tx.clone();
                async move { conn.connect(ingest).await }
            })
            .await;

        if let Err(e) = connect_result {
            warn!("relay {} failed to connect: {}", url, e);
        }

        // A concurrent re-registration may have replaced us mid-connect;
        // tear the orphan down so no socket outlives its map entry.
        let still_registered = {
            let relays = self.relays.read().await;
            relays
                .get(url)
                .map(|current| Arc::ptr_eq(current, &conn))
                .unwrap_or(false)
        };
        if !still_registered {
            conn.disconnect().await;
        }

        Ok(())
    }

    /// Drop a relay from the pool and close its connection.
    ///
    /// Subscriptions already fanned out through this relay keep running
    /// against their remaining relays.
    pub async fn remove_relay(&self, url: &str) {
        let removed = self.relays.write().await.remove(url);
        if let Some(conn) = removed {
            info!("removing relay: {}", url);
            conn.disconnect().await;
        }

        let mut subs = self.subscriptions.write().await;
        for handle in subs.values_mut() {
            handle.tracker.remove_relay(url);
            Self::maybe_emit_eose(handle);
        }
    }

    /// Read-only snapshots of every registered relay.
    pub async fn relays(&self) -> Vec<RelayDescriptor> {
        let relays = self.relays.read().await;
        let mut snapshots = Vec::with_capacity(relays.len());
        for conn in relays.values() {
            snapshots.push(conn.snapshot().await);
        }
        snapshots
    }

    /// URLs of connected relays flagged for reading. Computed fresh on
    /// every call, never cached.
    pub async fn read_relays(&self) -> Vec<String> {
        self.flagged_relays(false).await
    }

    /// URLs of connected relays flagged for writing. Computed fresh on
    /// every call, never cached.
    pub async fn write_relays(&self) -> Vec<String> {
        self.flagged_relays(true).await
    }

    async fn flagged_relays(&self, write: bool) -> Vec<String> {
        let relays = self.relays.read().await;
        let mut urls = Vec::new();
        for (url, conn) in relays.iter() {
            let flagged = if write {
                conn.options().write
            } else {
                conn.options().read
            };
            if flagged && conn.is_connected().await {
                urls.push(url.clone());
            }
        }
        urls
    }

    /// Resolve the fan-out set: the caller's explicit list, or the current
    /// read/write relay set. Only currently connected relays qualify.
    async fn resolve_targets(
        &self,
        requested: Option<&[String]>,
        write: bool,
    ) -> Vec<(String, Arc<RelayConnection>)> {
        let relays = self.relays.read().await;
        let mut targets = Vec::new();
        match requested {
            Some(urls) => {
                for url in urls {
                    if let Some(conn) = relays.get(url) {
                        if conn.is_connected().await {
                            targets.push((url.clone(), Arc::clone(conn)));
                        }
                    }
                }
            }
            None => {
                for (url, conn) in relays.iter() {
                    let flagged = if write {
                        conn.options().write
                    } else {
                        conn.options().read
                    };
                    if flagged && conn.is_connected().await {
                        targets.push((url.clone(), Arc::clone(conn)));
                    }
                }
            }
        }
        targets
    }

    /// Open a logical subscription fanned out across relays.
    ///
    /// Returns a channel of [`SubscriptionMessage`]s. Each delivered event
    /// is stamped with its relay of origin, a local receipt timestamp, and a
    /// verification flag. The same event id may arrive once per relay —
    /// deduplication is deliberately left to the consumer so provenance
    /// survives. [`SubscriptionMessage::EndOfStored`] is emitted once, when
    /// every relay in the fan-out has finished its backfill.
    ///
    /// Fails with [`ClientError::NoRelaysAvailable`] before any network
    /// activity when the resolved relay set is empty.
    pub async fn subscribe(
        &self,
        subscription_id: &str,
        config: SubscriptionConfig,
    ) -> Result<mpsc::UnboundedReceiver<SubscriptionMessage>> {
        let targets = self
            .resolve_targets(config.relay_urls.as_deref(), false)
            .await;
        if targets.is_empty() {
            return Err(ClientError::NoRelaysAvailable);
        }

        info!(
            "subscribing {} across {} relays",
            subscription_id,
            targets.len()
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let msg = ClientMessage::Req {
            subscription_id: subscription_id.to_string(),
            filters: config.filters,
        };

        // Register before sending any REQ and keep the map locked until the
        // fan-out is complete, so no early EVENT/EOSE races past the router.
        let mut subs = self.subscriptions.write().await;
        subs.insert(
            subscription_id.to_string(),
            SubscriptionHandle {
                tx,
                tracker: SubscriptionTracker::new(),
                eose_emitted: false,
            },
        );

        let mut reached = 0usize;
        for (url, conn) in &targets {
            match conn.send(&msg).await {
                Ok(()) => {
                    if let Some(handle) = subs.get_mut(subscription_id) {
                        handle.tracker.add_relay(url.clone());
                    }
                    reached += 1;
                }
                Err(e) => {
                    warn!("failed to subscribe on {}: {}", url, e);
                }
            }
        }

        if reached == 0 {
            subs.remove(subscription_id);
            return Err(ClientError::NoRelaysAvailable);
        }

        Ok(rx)
    }

    /// Close a subscription. Idempotent: unknown or already-closed ids are
    /// a no-op. Stops further deliveries; frames already in flight are
    /// suppressed because the channel sender is dropped here.
    pub async fn unsubscribe(&self, subscription_id: &str) {
        let handle = self.subscriptions.write().await.remove(subscription_id);
        let Some(handle) = handle else {
            return;
        };

        info!("closing subscription {}", subscription_id);

        let msg = ClientMessage::Close {
            subscription_id: subscription_id.to_string(),
        };
        let relays = self.relays.read().await;
        for url in handle.tracker.relays() {
            if let Some(conn) = relays.get(url) {
                if let Err(e) = conn.send(&msg).await {
                    debug!("failed to CLOSE {} on {}: {}", subscription_id, url, e);
                }
            }
        }
    }

    /// Publish an event to the caller's relays or the current write set.
    ///
    /// Outcomes are collected independently per relay: one relay rejecting
    /// or timing out never hides another's acceptance, and no quorum is
    /// imposed here. A relay that fails degrades to error status; the only
    /// error this method returns is an empty resolved relay set.
    pub async fn publish(
        &self,
        event: &nostr_core::Event,
        relay_urls: Option<&[String]>,
    ) -> Result<Vec<PublishOutcome>> {
        let targets = self.resolve_targets(relay_urls, true).await;
        if targets.is_empty() {
            return Err(ClientError::NoRelaysAvailable);
        }

        info!("publishing {} to {} relays", event.id, targets.len());

        let publishes = targets.into_iter().map(|(url, conn)| {
            let event = event.clone();
            let pending = Arc::clone(&self.pending_publishes);
            let timeout = self.config.publish_timeout;
            async move {
                let key = (url.clone(), event.id.clone());
                let (tx, rx) = oneshot::channel();
                pending.lock().await.insert(key.clone(), tx);

                if let Err(e) = conn.send(&ClientMessage::Event(event)).await {
                    pending.lock().await.remove(&key);
                    return PublishOutcome {
                        relay_url: url,
                        accepted: false,
                        message: e.to_string(),
                    };
                }

                match tokio::time::timeout(timeout, rx).await {
                    Ok(Ok((accepted, message))) => PublishOutcome {
                        relay_url: url,
                        accepted,
                        message,
                    },
                    Ok(Err(_)) => PublishOutcome {
                        relay_url: url,
                        accepted: false,
                        message: "confirmation channel closed".to_string(),
                    },
                    Err(_) => {
                        pending.lock().await.remove(&key);
                        conn.mark_error("publish confirmation timeout").await;
                        PublishOutcome {
                            relay_url: url,
                            accepted: false,
                            message: "confirmation timeout".to_string(),
                        }
                    }
                }
            }
        });

        Ok(futures::future::join_all(publishes).await)
    }

    /// One-shot fetch of the first event matching `filter`.
    ///
    /// Returns `None` when nothing matched within the query budget — which
    /// cannot be told apart from no relay responding; callers needing that
    /// distinction must inspect per-relay state themselves.
    pub async fn fetch_event(
        &self,
        filter: Filter,
        relay_urls: Option<&[String]>,
    ) -> Option<IncomingEvent> {
        let filter = if filter.limit.is_none() {
            filter.limit(1)
        } else {
            filter
        };

        let subscription_id = format!("fetch-{}", generate_subscription_id());
        let config = SubscriptionConfig {
            filters: vec![filter],
            relay_urls: relay_urls.map(<[String]>::to_vec),
        };

        let mut rx = match self.subscribe(&subscription_id, config).await {
            Ok(rx) => rx,
            Err(e) => {
                debug!("fetch_event could not subscribe: {}", e);
                return None;
            }
        };

        let result = tokio::time::timeout(self.config.query_timeout, async {
            while let Some(msg) = rx.recv().await {
                match msg {
                    SubscriptionMessage::Event(incoming) => return Some(incoming),
                    SubscriptionMessage::EndOfStored => return None,
                }
            }
            None
        })
        .await
        .unwrap_or(None);

        self.unsubscribe(&subscription_id).await;
        result
    }

    /// Best-effort fetch of a relay's self-reported information document.
    ///
    /// The relay's WebSocket URL is mapped to its HTTP endpoint
    /// (`wss -> https`, `ws -> http`) and queried with
    /// `Accept: application/nostr+json`. Any failure — network error,
    /// non-success status, malformed body — yields `None`; this is
    /// informational metadata, not required for correctness.
    pub async fn fetch_relay_info(&self, url: &str) -> Option<RelayInformation> {
        let http_url = if let Some(rest) = url.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if let Some(rest) = url.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else {
            url.to_string()
        };

        let response = match self
            .http
            .get(&http_url)
            .header(reqwest::header::ACCEPT, RELAY_INFO_ACCEPT_HEADER)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("failed to fetch relay info from {}: {}", http_url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "relay info request to {} returned {}",
                http_url,
                response.status()
            );
            return None;
        }

        match response.json::<RelayInformation>().await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("malformed relay info document from {}: {}", http_url, e);
                None
            }
        }
    }

    /// Close every subscription, then every connection. Safe to call any
    /// number of times; leaves no dangling sockets or tasks.
    pub async fn close(&self) {
        let subscriptions: Vec<(String, SubscriptionHandle)> =
            self.subscriptions.write().await.drain().collect();

        {
            let relays = self.relays.read().await;
            for (subscription_id, handle) in &subscriptions {
                let msg = ClientMessage::Close {
                    subscription_id: subscription_id.clone(),
                };
                for url in handle.tracker.relays() {
                    if let Some(conn) = relays.get(url) {
                        let _ = conn.send(&msg).await;
                    }
                }
            }
        }
        drop(subscriptions); // dropping the senders ends every receiver

        let relays: Vec<(String, Arc<RelayConnection>)> =
            self.relays.write().await.drain().collect();
        for (_, conn) in relays {
            conn.disconnect().await;
        }

        self.pending_publishes.lock().await.clear();
        info!("relay manager closed");
    }

    /// Number of currently connected relays.
    pub async fn connected_count(&self) -> usize {
        let relays = self.relays.read().await;
        let mut count = 0;
        for conn in relays.values() {
            if conn.is_connected().await {
                count += 1;
            }
        }
        count
    }

    /// Active subscription ids.
    pub async fn subscription_ids(&self) -> Vec<String> {
        self.subscriptions.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> RelayManager {
        RelayManager::new(ManagerConfig {
            connect_timeout: Duration::from_millis(200),
            publish_timeout: Duration::from_millis(200),
            query_timeout: Duration::from_millis(200),
            retry: RetryPolicy::no_retry(),
        })
    }

    #[tokio::test]
    async fn test_new_manager_is_empty() {
        let manager = manager();
        assert!(manager.relays().await.is_empty());
        assert!(manager.subscription_ids().await.is_empty());
        assert_eq!(manager.connected_count().await, 0);
    }

    #[tokio::test]
    async fn test_add_relay_rejects_invalid_url() {
        let manager = manager();
        let result = manager
            .add_relay("https://relay.example.com", RelayOptions::default())
            .await;
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_add_unreachable_relay_records_error() {
        let manager = manager();
        // reserved TEST-NET address, nothing listens there
        manager
            .add_relay("ws://192.0.2.1:1", RelayOptions::default())
            .await
            .unwrap();

        let snapshots = manager.relays().await;
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].status, crate::connection::RelayStatus::Error);
        assert!(snapshots[0].error.is_some());
        assert!(manager.read_relays().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_relay_unknown_is_noop() {
        let manager = manager();
        manager.remove_relay("ws://never.added.example.com").await;
        assert!(manager.relays().await.is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_with_no_relays_fails_before_io() {
        let manager = manager();
        let result = manager
            .subscribe(
                "sub1",
                SubscriptionConfig {
                    filters: vec![Filter::new().kinds(vec![1])],
                    relay_urls: Some(vec![]),
                },
            )
            .await;
        assert!(matches!(result, Err(ClientError::NoRelaysAvailable)));

        // default read set is also empty
        let result = manager
            .subscribe(
                "sub2",
                SubscriptionConfig {
                    filters: vec![Filter::new().kinds(vec![1])],
                    relay_urls: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ClientError::NoRelaysAvailable)));
        assert!(manager.subscription_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_with_no_relays_fails() {
        let manager = manager();
        let event = nostr_core::create_text_note(
            "hello",
            vec![],
            &nostr_core::generate_keypair().private_key,
        )
        .unwrap();

        let result = manager.publish(&event, None).await;
        assert!(matches!(result, Err(ClientError::NoRelaysAvailable)));
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_is_noop() {
        let manager = manager();
        manager.unsubscribe("never-existed").await;
        manager.unsubscribe("never-existed").await;
    }

    #[tokio::test]
    async fn test_close_twice_is_safe() {
        let manager = manager();
        manager.close().await;
        manager.close().await;
        assert!(manager.relays().await.is_empty());
        assert!(manager.subscription_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_event_with_no_relays_returns_none() {
        let manager = manager();
        let result = manager.fetch_event(Filter::new().kinds(vec![1]), None).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fetch_relay_info_unreachable_returns_none() {
        let manager = manager();
        assert!(manager.fetch_relay_info("ws://192.0.2.1:1").await.is_none());
    }
}
