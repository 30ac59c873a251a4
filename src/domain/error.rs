use thiserror::Error;

/// Why a delivery strategy could not record an entry.
///
/// Strategies return this instead of unwinding; the `Logger` turns every
/// variant into a plain `false` for its caller.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("All {attempted} aggregated loggers failed")]
    AllFailed { attempted: usize },

    #[error("Delivery panicked: {0}")]
    Panicked(String),
}

impl DeliveryError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Builds a `Panicked` error from a `catch_unwind` payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panicked(message)
    }
}
