//! ---
//! sim_section: "03-transport"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Publish/subscribe transport abstraction and backends."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
//! Message transport abstraction used by every device session.
//!
//! The simulation core treats delivery as an opaque collaborator: it connects
//! once, hands payloads over with a QoS level and retain flag, and closes the
//! connection on shutdown. Broker acknowledgment handling and retries live
//! inside the backend's own delivery loop, never in the tick loop.

pub mod memory;
pub mod mqtt;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{InMemoryTransport, PublishRecord};
pub use mqtt::MqttTransport;

/// Convenience alias for transport results.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by transport backends.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The broker handshake failed. Fatal for the owning session.
    #[error("broker connection failed: {0}")]
    Connect(String),
    /// A single publish could not be handed to the delivery loop.
    #[error("publish on '{topic}' failed: {reason}")]
    Publish {
        /// Topic the payload was destined for.
        topic: String,
        /// Backend-specific failure description.
        reason: String,
    },
    /// An operation was attempted before `connect` succeeded.
    #[error("transport is not connected")]
    NotConnected,
}

/// Delivery guarantee requested for a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QosLevel {
    /// Deliver the message at most once; no acknowledgment tracking.
    AtMostOnce,
    /// Deliver the message at least once; duplicates possible.
    AtLeastOnce,
    /// Exactly-once delivery between publisher and broker.
    ExactlyOnce,
}

/// Transport abstraction offered to the simulation core.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the broker handshake. Must be called before any publish.
    async fn connect(&mut self) -> Result<()>;

    /// Hand a payload to the delivery loop. Fire-and-forget from the caller's
    /// perspective; completion does not imply broker acknowledgment.
    async fn publish(&self, topic: &str, payload: Vec<u8>, qos: QosLevel, retain: bool)
        -> Result<()>;

    /// Stop the background delivery loop and close the connection.
    async fn disconnect(&mut self) -> Result<()>;

    /// Human-readable backend name for logging.
    fn name(&self) -> &'static str;
}
