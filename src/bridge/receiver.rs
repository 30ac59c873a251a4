use super::endpoint::DEFAULT_PORT;
use super::message::BridgeMessage;
use super::subscribers::{SubscriberSet, SubscriptionId};
use super::BridgeError;
use crate::domain::LogEntry;
use axum::Router;
use axum::body::{self, Body};
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, FixedOffset, Local};
use parking_lot::Mutex;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Largest request body the receiver buffers; longer bodies are dropped.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub host: IpAddr,
    /// 0 picks a free port.
    pub port: u16,
}

impl ReceiverConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverStatus {
    Stopped,
    Starting,
    Listening,
    Stopping,
}

impl fmt::Display for ReceiverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Listening => "listening",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

enum Phase {
    Stopped,
    Starting {
        abort: CancellationToken,
    },
    Listening {
        addr: SocketAddr,
        shutdown: CancellationToken,
        server: JoinHandle<()>,
    },
    Stopping,
}

impl Phase {
    fn status(&self) -> ReceiverStatus {
        match self {
            Self::Stopped => ReceiverStatus::Stopped,
            Self::Starting { .. } => ReceiverStatus::Starting,
            Self::Listening { .. } => ReceiverStatus::Listening,
            Self::Stopping => ReceiverStatus::Stopping,
        }
    }
}

/// Long-lived HTTP listener that turns posted JSON back into entries.
///
/// Every request, whatever its method or path, is answered `200` with an
/// empty body. Bodies that parse as a bridge message are rebuilt into a
/// [`LogEntry`] and handed to each subscriber before the response is sent;
/// anything else is dropped silently.
pub struct BridgeReceiver {
    config: ReceiverConfig,
    subscribers: Arc<SubscriberSet>,
    phase: Mutex<Phase>,
}

impl BridgeReceiver {
    pub fn new(config: ReceiverConfig) -> Self {
        Self {
            config,
            subscribers: Arc::new(SubscriberSet::new()),
            phase: Mutex::new(Phase::Stopped),
        }
    }

    pub fn status(&self) -> ReceiverStatus {
        self.phase.lock().status()
    }

    /// Bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.phase.lock() {
            Phase::Listening { addr, .. } => Some(*addr),
            _ => None,
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// The request handling without a listener, sharing this receiver's
    /// subscribers.
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.subscribers))
    }

    /// Binds and starts serving. Returns the bound address.
    ///
    /// Calling this while already listening returns the current address.
    pub async fn start(&self) -> Result<SocketAddr, BridgeError> {
        let abort = {
            let mut phase = self.phase.lock();
            match &*phase {
                Phase::Listening { addr, .. } => return Ok(*addr),
                Phase::Starting { .. } | Phase::Stopping => return Err(BridgeError::Busy),
                Phase::Stopped => {}
            }
            let abort = CancellationToken::new();
            *phase = Phase::Starting {
                abort: abort.clone(),
            };
            abort
        };

        let address = SocketAddr::new(self.config.host, self.config.port);
        let bound = match TcpListener::bind(address).await {
            Ok(listener) => listener.local_addr().map(|addr| (listener, addr)),
            Err(e) => Err(e),
        };
        let (listener, local_addr) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                self.roll_back(&abort);
                return Err(BridgeError::Bind {
                    address: address.to_string(),
                    source,
                });
            }
        };

        let mut phase = self.phase.lock();
        // stop() ran while binding; the listener is dropped here
        if abort.is_cancelled() {
            return Err(BridgeError::StartAborted);
        }

        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve(listener, self.router(), shutdown.clone()));
        *phase = Phase::Listening {
            addr: local_addr,
            shutdown,
            server,
        };

        info!("Bridge receiver listening on {local_addr}");
        Ok(local_addr)
    }

    /// Stops accepting connections without waiting for in-flight requests.
    ///
    /// Idempotent. A `start` still binding is told to give up.
    pub fn stop(&self) {
        let mut phase = self.phase.lock();
        match std::mem::replace(&mut *phase, Phase::Stopped) {
            Phase::Listening { addr, shutdown, .. } => {
                shutdown.cancel();
                info!("Bridge receiver on {addr} stopped");
            }
            Phase::Starting { abort } => abort.cancel(),
            // A concurrent shutdown() completes the transition
            Phase::Stopping => *phase = Phase::Stopping,
            Phase::Stopped => {}
        }
    }

    /// Like [`stop`](Self::stop), but waits until in-flight requests have
    /// completed and the port is released.
    pub async fn shutdown(&self) {
        let server = {
            let mut phase = self.phase.lock();
            match std::mem::replace(&mut *phase, Phase::Stopping) {
                Phase::Listening { addr, shutdown, server } => {
                    shutdown.cancel();
                    info!("Bridge receiver on {addr} shutting down");
                    Some(server)
                }
                Phase::Starting { abort } => {
                    abort.cancel();
                    *phase = Phase::Stopped;
                    None
                }
                other => {
                    *phase = other;
                    None
                }
            }
        };

        if let Some(server) = server {
            if let Err(e) = server.await {
                warn!("Bridge receiver task failed: {e}");
            }
            *self.phase.lock() = Phase::Stopped;
        }
    }

    fn roll_back(&self, abort: &CancellationToken) {
        let mut phase = self.phase.lock();
        if !abort.is_cancelled() {
            *phase = Phase::Stopped;
        }
    }
}

impl Default for BridgeReceiver {
    fn default() -> Self {
        Self::new(ReceiverConfig::default())
    }
}

impl Drop for BridgeReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for BridgeReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeReceiver")
            .field("config", &self.config)
            .field("status", &self.status())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

async fn serve(listener: TcpListener, app: Router, shutdown: CancellationToken) {
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    {
        warn!("Bridge receiver server error: {e}");
    }
}

/// Router answering every method and path with the receive handler.
pub fn router(subscribers: Arc<SubscriberSet>) -> Router {
    Router::new()
        .fallback(receive_handler)
        .with_state(subscribers)
}

async fn receive_handler(
    State(subscribers): State<Arc<SubscriberSet>>,
    body: Body,
) -> StatusCode {
    let received_at = Local::now().fixed_offset();

    let bytes = match body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Failed to read request body");
            return StatusCode::OK;
        }
    };

    if let Some(entry) = decode(&bytes, received_at) {
        // Subscribers may block on their own sinks
        let published = tokio::task::spawn_blocking(move || subscribers.emit(&entry)).await;
        if let Err(e) = published {
            debug!(error = %e, "Publishing received entry failed");
        }
    }

    StatusCode::OK
}

/// Rebuilds an entry from a request body; `None` for anything unusable.
pub(crate) fn decode(body: &[u8], received_at: DateTime<FixedOffset>) -> Option<LogEntry> {
    if body.is_empty() {
        return None;
    }

    let text = match std::str::from_utf8(body) {
        Ok(text) => text,
        Err(e) => {
            debug!(error = %e, "Request body is not UTF-8");
            return None;
        }
    };

    match serde_json::from_str::<BridgeMessage>(text) {
        Ok(message) => Some(message.into_entry(received_at)),
        Err(e) => {
            debug!(error = %e, "Request body is not a bridge message");
            None
        }
    }
}
