//! Wire protocol for Shuffler.
//!
//! This crate defines what a host and its clients say to each other:
//!
//! - **Types** ([`CardType`], [`ClientMessage`], [`ServerMessage`]) carry the
//!   messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) decide how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) describe what can go wrong during
//!   encoding/decoding.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Table (rules)
//! ```
//!
//! [`PeerId`] is re-exported from the transport so the layers above can
//! name clients without depending on the transport crate directly.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use shuffler_transport::PeerId;
pub use types::{CardType, ClientMessage, ServerMessage};
