use super::endpoint::RemoteEndpoint;
use super::message::BridgeMessage;
use super::BridgeError;
use crate::domain::{DeliveryError, LogEntry, ThreadContext};
use crate::logger::Delivery;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Upper bound on POSTs running at once across all endpoints.
    pub max_in_flight: usize,
    pub user_agent: String,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_in_flight: 256,
            user_agent: format!("rask-log-bridge/{}", crate::VERSION),
        }
    }
}

/// Relays entries as JSON to every registered endpoint.
///
/// Sends are fire-and-forget: `deliver` spawns one task per endpoint and
/// returns `Ok` without waiting. Endpoint failures are only traced at debug
/// level. When `max_in_flight` sends are already running, further sends are
/// dropped.
pub struct HttpSender {
    client: Client,
    endpoints: RwLock<HashSet<RemoteEndpoint>>,
    in_flight: Arc<Semaphore>,
    max_in_flight: usize,
    runtime: Handle,
}

impl HttpSender {
    /// Must be called from within a tokio runtime.
    pub fn new(config: SenderConfig) -> Result<Self, BridgeError> {
        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;

        if config.max_in_flight == 0 {
            return Err(BridgeError::InvalidConfiguration(
                "max_in_flight must be at least 1".to_string(),
            ));
        }

        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoints: RwLock::new(HashSet::new()),
            in_flight: Arc::new(Semaphore::new(config.max_in_flight)),
            max_in_flight: config.max_in_flight,
            runtime,
        })
    }

    /// Registers `host:port`. Returns `false` if it was already present.
    pub fn add_endpoint(&self, host: &str, port: u16) -> Result<bool, BridgeError> {
        let endpoint = RemoteEndpoint::new(host, port)?;
        // Surface unusable hosts now rather than on every send
        endpoint.url()?;
        Ok(self.endpoints.write().insert(endpoint))
    }

    /// Returns `false` if the endpoint was not registered.
    pub fn remove_endpoint(&self, host: &str, port: u16) -> bool {
        RemoteEndpoint::new(host, port)
            .map(|endpoint| self.endpoints.write().remove(&endpoint))
            .unwrap_or(false)
    }

    pub fn endpoints(&self) -> Vec<RemoteEndpoint> {
        self.endpoints.read().iter().cloned().collect()
    }

    /// Number of sends that have been spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.in_flight.available_permits()
    }

    fn send_to(&self, endpoint: &RemoteEndpoint, body: Bytes) {
        let Ok(permit) = Arc::clone(&self.in_flight).try_acquire_owned() else {
            debug!(%endpoint, "Too many sends in flight, dropping message");
            return;
        };

        let url = match endpoint.url() {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "Skipping endpoint");
                return;
            }
        };

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let endpoint = endpoint.clone();

        self.runtime.spawn(async move {
            let _permit = permit;
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if let Err(e) = response.bytes().await {
                        debug!(%endpoint, error = %e, "Failed to drain response body");
                    }
                    debug!(%endpoint, %status, "Message relayed");
                }
                Err(e) => debug!(%endpoint, error = %e, "Relay request failed"),
            }
        });
    }
}

impl Delivery for HttpSender {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        let endpoints = self.endpoints();
        if endpoints.is_empty() {
            return Ok(());
        }

        let thread = ThreadContext::capture();
        let message = BridgeMessage::from_entry(entry, Uuid::new_v4(), Some(&thread));
        let body = Bytes::from(serde_json::to_vec(&message)?);

        for endpoint in &endpoints {
            self.send_to(endpoint, body.clone());
        }

        Ok(())
    }
}

impl std::fmt::Debug for HttpSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSender")
            .field("endpoints", &self.endpoints())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
