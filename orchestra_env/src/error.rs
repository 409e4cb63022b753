//! Error types for the environment abstraction.

use thiserror::Error;

/// Errors that can occur at the transport boundary.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The transport has shut down (channel closed, broker gone).
    #[error("Transport closed: {0}")]
    TransportClosed(String),

    /// A receiver's mailbox no longer exists.
    #[error("Node unreachable: {0}")]
    NodeUnreachable(String),

    /// Envelope could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EnvError {
    /// Creates a transport-closed error.
    pub fn closed(msg: impl Into<String>) -> Self {
        Self::TransportClosed(msg.into())
    }

    /// Creates an unreachable error.
    pub fn unreachable(node: impl std::fmt::Display) -> Self {
        Self::NodeUnreachable(node.to_string())
    }
}
