//! Domain layer for rask-log-bridge.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEntry`: The pipeline's immutable unit of diagnostic data
//! - `LogCategory` / `LogPriority`: Ordered severity and priority scales
//! - `ThreadContext`: Best-effort snapshot of the emitting thread
//! - `DeliveryError`: Why a delivery strategy reported failure

pub mod category;
pub mod error;
pub mod log_entry;
pub mod thread;

pub use category::{LogCategory, LogPriority};
pub use error::DeliveryError;
pub use log_entry::{LogEntry, normalize_tag};
pub use thread::{ThreadContext, UserContext};
