#![warn(rust_2018_idioms)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,           // Enum discriminants widened with `as`
    clippy::missing_errors_doc,      // Internal API
    clippy::missing_panics_doc,      // Internal API
    clippy::module_name_repetitions, // e.g. BridgeError in bridge module
    clippy::must_use_candidate,      // Annotated selectively on critical APIs
    clippy::doc_markdown             // Internal API
)]

pub mod app;
pub mod bridge;
pub mod domain;
pub mod global;
pub mod logger;
pub mod monitor;

// Re-export main types for easy access
pub use bridge::{BridgeError, BridgeReceiver, HttpSender, ReceiverConfig, SenderConfig};
pub use domain::{DeliveryError, LogCategory, LogEntry, LogPriority};
pub use logger::{Delivery, Filter, Logger, LoggerBuilder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
