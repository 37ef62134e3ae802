//! Error types for the table layer.

use std::path::PathBuf;

use shuffler_protocol::{CardType, PeerId};

/// Errors that can occur while applying a rule or loading a template.
///
/// Every rule checks its preconditions before touching state, so an `Err`
/// from a [`Table`](crate::Table) method always means nothing changed.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// No hand is registered for this client.
    #[error("client {0} is not at the table")]
    UnknownClient(PeerId),

    /// A hand is already registered for this client.
    #[error("client {0} is already at the table")]
    AlreadyConnected(PeerId),

    /// A `useCard` index outside `0..hand_len`.
    #[error("client {peer} tried to use card {index} but holds {hand_len}")]
    InvalidIndex {
        peer: PeerId,
        index: i64,
        hand_len: usize,
    },

    /// Discarding a card type whose in-use count is zero.
    #[error("no \"{0}\" card is in use")]
    NotInUse(CardType),

    /// The deck template is malformed.
    #[error("invalid deck template: {0}")]
    InvalidTemplate(String),

    /// The deck template file could not be read.
    #[error("failed to read deck template {}: {source}", path.display())]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
