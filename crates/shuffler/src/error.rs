//! Unified error type for Shuffler.

use shuffler_protocol::ProtocolError;
use shuffler_table::TableError;
use shuffler_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The host, the operator console and the client coordinator all return
/// this one type. The `#[from]` attribute on each wrapping variant lets `?`
/// convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ShufflerError {
    /// A transport-level error (bind, connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A rule rejected the action (unknown client, bad index, nothing in use).
    #[error(transparent)]
    Table(#[from] TableError),

    /// The host actor has stopped and no longer accepts commands.
    #[error("host is not running")]
    HostUnavailable,

    /// `use` was requested without a selected card.
    #[error("no card selected")]
    NoSelection,

    /// A selection outside the current hand.
    #[error("cannot select card {index}, hand holds {hand_len}")]
    InvalidSelection { index: usize, hand_len: usize },

    /// A client was started without a host to join.
    #[error("no host id given")]
    MissingHostId,

    /// Copying to the system clipboard failed.
    #[error("clipboard: {0}")]
    Clipboard(String),

    /// Reading or writing a console stream failed.
    #[error("console I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a console line could not be parsed into a command.
///
/// Consoles print this and keep reading; it never ends a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    /// The first word is not a command.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// The command needs an argument that was not given.
    #[error("usage: {0}")]
    Usage(&'static str),
}
