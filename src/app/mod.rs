//! The `rask-log-bridge` binary: a receiver that prints and relays.
//!
//! ```text
//! POST ─► BridgeReceiver ─► Logger(Aggregate)
//!                              ├── Synchronized(Text(stdout))  [min_category]
//!                              └── HttpSender(relays)          [only if relays]
//! ```

pub mod config;
pub mod shutdown;
pub mod tracing;

pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use shutdown::shutdown_signal;

use crate::bridge::{BridgeError, BridgeReceiver, HttpSender, ReceiverConfig};
use crate::global;
use crate::logger::{AggregateDelivery, CategoryFilter, Logger, SynchronizedDelivery, TextDelivery};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use ::tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Builds the logger received entries are handed to.
///
/// Must be called inside a tokio runtime when relays are configured.
pub fn build_logger(config: &Config) -> Result<Logger, AppError> {
    let console = Logger::builder(SynchronizedDelivery::new(TextDelivery::stdout()))
        .filter(CategoryFilter::new(config.min_category))
        .build();
    let mut aggregate = AggregateDelivery::new().with(Arc::new(console));

    let relays = config.relay_endpoints()?;
    if !relays.is_empty() {
        let sender = HttpSender::new(config.sender_config())?;
        for endpoint in &relays {
            sender.add_endpoint(endpoint.host(), endpoint.port())?;
        }
        info!(relays = relays.len(), "Relaying received entries");
        aggregate.push(Arc::new(Logger::new(sender)));
    }

    Ok(Logger::new(aggregate))
}

/// Serves until `shutdown` resolves, then stops the receiver.
pub async fn run<S>(config: Config, shutdown: S) -> Result<(), AppError>
where
    S: Future<Output = ()>,
{
    let logger = Arc::new(build_logger(&config)?);
    global::set_logger(Arc::clone(&logger));

    let receiver = BridgeReceiver::new(ReceiverConfig::with_port(config.port));
    receiver.subscribe(move |entry| {
        if !logger.log_entry(entry) {
            debug!(id = ?entry.id(), "Received entry was not delivered");
        }
    });

    let addr = receiver.start().await?;
    info!("rask-log-bridge {} listening on {addr}", crate::VERSION);

    shutdown.await;
    receiver.shutdown().await;
    global::clear();

    info!("rask-log-bridge stopped");
    Ok(())
}
