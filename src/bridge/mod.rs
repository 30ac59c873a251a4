//! HTTP bridge: relays entries between processes as JSON.
//!
//! [`HttpSender`] is a [`Delivery`](crate::logger::Delivery) that POSTs each
//! entry to every registered [`RemoteEndpoint`]. [`BridgeReceiver`] listens
//! for those POSTs and republishes the rebuilt entries to local subscribers.

pub mod endpoint;
pub mod error;
pub mod message;
pub mod receiver;
pub mod sender;
pub mod subscribers;

pub use endpoint::{DEFAULT_PORT, RemoteEndpoint};
pub use error::BridgeError;
pub use message::BridgeMessage;
pub use receiver::{BridgeReceiver, MAX_BODY_BYTES, ReceiverConfig, ReceiverStatus, router};
pub use sender::{HttpSender, SenderConfig};
pub use subscribers::{SubscriberSet, SubscriptionId};
