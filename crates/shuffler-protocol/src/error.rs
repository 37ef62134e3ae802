//! Error types for the protocol layer.
//!
//! Each crate in Shuffler defines its own error enum. A `ProtocolError`
//! always means the bytes on the wire could not be turned into (or made
//! from) a message, never that the game rejected a command.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a message).
    ///
    /// This is what an unknown message kind looks like from the receiving
    /// side: `{"name": "flyToMoon"}` does not match any variant.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
