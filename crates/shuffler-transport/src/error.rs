use crate::PeerId;

/// Errors that can occur in the transport layer.
///
/// Failures from the WebSocket library are carried as text so this type
/// does not depend on which transport feature is enabled.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// A TCP connection arrived but the WebSocket upgrade failed.
    #[error("handshake with {remote} failed: {reason}")]
    Handshake { remote: String, reason: String },

    /// Dialing a host failed.
    #[error("connect to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    /// Sending to a peer failed.
    #[error("send to {peer} failed: {reason}")]
    Send { peer: PeerId, reason: String },

    /// Receiving from a peer failed.
    #[error("receive from {peer} failed: {reason}")]
    Receive { peer: PeerId, reason: String },
}
