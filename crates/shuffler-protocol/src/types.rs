//! Message types for Shuffler's wire format.
//!
//! Two enums travel on the wire: [`ClientMessage`] (client → host) and
//! [`ServerMessage`] (host → client). Both use the same JSON shape so a
//! browser client can switch on one field:
//!
//! ```text
//! { "name": "drawCard" }
//! { "name": "useCard", "data": 1 }
//! { "name": "updateCards", "data": ["Fireball", "Shield"] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CardType
// ---------------------------------------------------------------------------

/// The label of a kind of card, e.g. `"Fireball"`.
///
/// Cards are fungible within a type: two `"Fireball"` cards are
/// indistinguishable, so piles and hands only ever store the label.
///
/// `#[serde(transparent)]` serializes this as a bare JSON string, which is
/// what clients already expect inside `updateCards`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardType(String);

impl CardType {
    /// Creates a card type from its label.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CardType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ---------------------------------------------------------------------------
// Client → host
// ---------------------------------------------------------------------------

/// Commands a client sends to the host.
///
/// `#[serde(tag = "name", content = "data")]` produces "adjacently tagged"
/// JSON: the variant name goes in `"name"` and its payload (if any) in
/// `"data"`. Unit variants carry no `"data"` field at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// "Give me the top card of the draw pile."
    DrawCard,

    /// "Put the card at this position of my hand into play."
    ///
    /// Signed on purpose: the wire carries whatever integer the client
    /// sent, and a negative index must reach the host's range check
    /// rather than fail decoding.
    UseCard(i64),
}

// ---------------------------------------------------------------------------
// Host → client
// ---------------------------------------------------------------------------

/// Responses the host pushes to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The client's complete hand, in order. Always a full replacement,
    /// never a delta.
    UpdateCards(Vec<CardType>),
}

// =========================================================================
// Tests
// =========================================================================
