//! Single relay connection.
//!
//! Each connection is a small state machine:
//! `connecting -> connected | error`; `connected -> disconnected` on
//! explicit disconnect, or `-> error` on runtime failure. There is no
//! automatic reconnect here — re-establishing a dropped connection is the
//! owner's call.
//!
//! Once connected, a background read task parses incoming frames and
//! forwards them into the owner's ingest channel tagged with this relay's
//! URL; malformed frames are logged and skipped.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, Result};
use crate::message::{ClientMessage, RelayMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Messages flowing from relay connections into the manager's router.
pub(crate) type IngestMessage = (String, RelayMessage);

/// Connection status, as observed through [`RelayDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    /// Connection attempt in progress
    Connecting,
    /// Connected and ready
    Connected,
    /// Explicitly disconnected
    Disconnected,
    /// Failed to connect or failed at runtime
    Error,
}

/// Read/write intent for a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    /// Use this relay for subscriptions
    pub read: bool,
    /// Use this relay for publishing
    pub write: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

/// Connection tuning.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long to wait for the WebSocket handshake
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Read-only projection of a connection's state.
#[derive(Debug, Clone)]
pub struct RelayDescriptor {
    /// Relay URL
    pub url: String,
    /// Current status
    pub status: RelayStatus,
    /// Whether the relay is used for reads
    pub read: bool,
    /// Whether the relay is used for writes
    pub write: bool,
    /// Unix seconds of the last successful connect
    pub last_connected: Option<u64>,
    /// Last recorded error, if any
    pub error: Option<String>,
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A single relay connection. Owned and driven exclusively by the manager.
pub struct RelayConnection {
    url: Url,
    options: RelayOptions,
    config: ConnectionConfig,
    status: Arc<RwLock<RelayStatus>>,
    last_connected: Arc<RwLock<Option<u64>>>,
    last_error: Arc<RwLock<Option<String>>>,
    sink: Arc<Mutex<Option<WsSink>>>,
    read_task: Mutex<Option<JoinHandle<()>>>,
}

impl RelayConnection {
    /// Create a new connection descriptor (does not connect yet).
    pub fn new(url: &str, options: RelayOptions, config: ConnectionConfig) -> Result<Self> {
        let url = Url::parse(url)?;

        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(ClientError::InvalidUrl(format!(
                "URL must use ws:// or wss:// scheme, got: {}",
                url.scheme()
            )));
        }

        Ok(Self {
            url,
            options,
            config,
            status: Arc::new(RwLock::new(RelayStatus::Disconnected)),
            last_connected: Arc::new(RwLock::new(None)),
            last_error: Arc::new(RwLock::new(None)),
            sink: Arc::new(Mutex::new(None)),
            read_task: Mutex::new(None),
        })
    }

    /// Relay URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Read/write intent.
    pub fn options(&self) -> RelayOptions {
        self.options
    }

    /// Current status.
    pub async fn status(&self) -> RelayStatus {
        *self.status.read().await
    }

    /// Whether the connection is up.
    pub async fn is_connected(&self) -> bool {
        *self.status.read().await == RelayStatus::Connected
    }

    /// Record a runtime failure on this connection.
    pub async fn mark_error(&self, message: impl Into<String>) {
        let message = message.into();
        *self.status.write().await = RelayStatus::Error;
        *self.last_error.write().await = Some(message);
    }

    /// Read-only snapshot for observers.
    pub async fn snapshot(&self) -> RelayDescriptor {
        RelayDescriptor {
            url: self.url.to_string(),
            status: *self.status.read().await,
            read: self.options.read,
            write: self.options.write,
            last_connected: *self.last_connected.read().await,
            error: self.last_error.read().await.clone(),
        }
    }

    /// Establish the WebSocket connection and start the read task.
    ///
    /// Incoming frames are forwarded into `ingest` tagged with this relay's
    /// URL. On failure the status degrades to [`RelayStatus::Error`] and the
    /// error is returned for the caller's retry policy to act on.
    pub async fn connect(&self, ingest: mpsc::UnboundedSender<IngestMessage>) -> Result<()> {
        {
            let mut status = self.status.write().await;
            if *status == RelayStatus::Connected {
                return Ok(());
            }
            *status = RelayStatus::Connecting;
        }

        debug!("connecting to relay: {}", self.url);

        let ws_stream = match timeout(
            self.config.connect_timeout,
            connect_async(self.url.as_str()),
        )
        .await
        {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                self.mark_error(e.to_string()).await;
                return Err(ClientError::WebSocket(e.to_string()));
            }
            Err(_) => {
                let message = format!(
                    "connection timeout after {:?}",
                    self.config.connect_timeout
                );
                self.mark_error(message.clone()).await;
                return Err(ClientError::Timeout(message));
            }
        };

        let (sink, source) = ws_stream.split();
        *self.sink.lock().await = Some(sink);
        *self.status.write().await = RelayStatus::Connected;
        *self.last_connected.write().await = Some(unix_seconds());
        *self.last_error.write().await = None;

        info!("connected to relay: {}", self.url);

        self.spawn_read_task(source, ingest).await;

        Ok(())
    }

    async fn spawn_read_task(
        &self,
        mut source: WsSource,
        ingest: mpsc::UnboundedSender<IngestMessage>,
    ) {
        let url = self.url.to_string();
        let status = Arc::clone(&self.status);
        let last_error = Arc::clone(&self.last_error);
        let sink = Arc::clone(&self.sink);

        let handle = tokio::spawn(async move {
            loop {
                match source.next().await {
                    Some(Ok(Message::Text(text))) => {
                        match RelayMessage::from_json(text.as_str()) {
                            Ok(msg) => {
                                if ingest.send((url.clone(), msg)).is_err() {
                                    // manager gone, nothing left to deliver to
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("malformed frame from {}: {}", url, e);
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let mut guard = sink.lock().await;
                        if let Some(s) = guard.as_mut() {
                            let _ = s.send(Message::Pong(data)).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("relay {} closed connection", url);
                        let mut current = status.write().await;
                        if *current == RelayStatus::Connected {
                            *current = RelayStatus::Error;
                            *last_error.write().await =
                                Some("connection closed by relay".to_string());
                        }
                        break;
                    }
                    Some(Ok(_)) => {
                        // binary/pong frames carry nothing for us
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", url, e);
                        let mut current = status.write().await;
                        if *current == RelayStatus::Connected {
                            *current = RelayStatus::Error;
                            *last_error.write().await = Some(e.to_string());
                        }
                        break;
                    }
                    None => {
                        let mut current = status.write().await;
                        if *current == RelayStatus::Connected {
                            *current = RelayStatus::Error;
                            *last_error.write().await = Some("stream ended".to_string());
                        }
                        break;
                    }
                }
            }
        });

        *self.read_task.lock().await = Some(handle);
    }

    /// Send a protocol message to the relay.
    pub async fn send(&self, msg: &ClientMessage) -> Result<()> {
        if !self.is_connected().await {
            return Err(ClientError::NotConnected);
        }

        let text = msg
            .to_json()
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        debug!("sending to {}: {}", self.url, text);

        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(ClientError::NotConnected);
        };

        match sink.send(Message::Text(text.into())).await {
            Ok(()) => Ok(()),
            Err(e) => {
                drop(guard);
                self.mark_error(e.to_string()).await;
                Err(ClientError::WebSocket(e.to_string()))
            }
        }
    }

    /// Close the connection. Idempotent.
    pub async fn disconnect(&self) {
        {
            let mut status = self.status.write().await;
            if *status == RelayStatus::Disconnected {
                return;
            }
            *status = RelayStatus::Disconnected;
        }

        if let Some(handle) = self.read_task.lock().await.take() {
            handle.abort();
        }

        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }

        info!("disconnected from relay: {}", self.url);
    }
}
