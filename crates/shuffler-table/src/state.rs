//! Session state: where every card currently is.
//!
//! A card is always in exactly one of four places:
//!
//! ```text
//!   draw pile ──draw──→ hand ──use──→ in-use tally ──discard──→ discard pile
//!       ↑                                                           │
//!       └──────────────────── reshuffle ────────────────────────────┘
//! ```
//!
//! `SessionState` only *represents* that configuration. The transitions
//! live in [`Table`](crate::Table), which is the sole writer.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use shuffler_protocol::{CardType, PeerId};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The full authoritative state of one card session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Undealt cards. The LAST element is the next card drawn.
    pub(crate) draw_pile: Vec<CardType>,

    /// Cards returned to circulation, waiting for a reshuffle.
    pub(crate) discard_pile: Vec<CardType>,

    /// Each connected client's hand, in the order the cards were drawn.
    pub(crate) hands: HashMap<PeerId, Vec<CardType>>,

    /// Used-but-not-yet-discarded cards per type. Types whose count drops
    /// to zero are removed, so every stored value is positive.
    pub(crate) in_use: BTreeMap<CardType, u32>,

    /// Bumped on every successful mutation.
    pub(crate) revision: u64,
}

impl SessionState {
    /// The draw pile, bottom first. `last()` is the next card drawn.
    pub fn draw_pile(&self) -> &[CardType] {
        &self.draw_pile
    }

    /// The discard pile, oldest first.
    pub fn discard_pile(&self) -> &[CardType] {
        &self.discard_pile
    }

    /// The hand of one client, or `None` if the client is not at the table.
    pub fn hand(&self, peer: &PeerId) -> Option<&[CardType]> {
        self.hands.get(peer).map(Vec::as_slice)
    }

    /// Every client with a hand entry.
    pub fn clients(&self) -> impl Iterator<Item = &PeerId> {
        self.hands.keys()
    }

    /// How many cards of this type are currently in use.
    pub fn in_use(&self, card_type: &CardType) -> u32 {
        self.in_use.get(card_type).copied().unwrap_or(0)
    }

    /// Total number of cards in use, over all types.
    pub fn in_use_total(&self) -> usize {
        self.in_use.values().map(|&n| n as usize).sum()
    }

    /// The mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of physical cards accounted for across piles, hands and the
    /// in-use tally. Equals the template's total at all times.
    pub fn card_count(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.hands.values().map(Vec::len).sum::<usize>()
            + self.in_use_total()
    }

    /// Takes a read-only snapshot for observers.
    pub fn status(&self) -> TableStatus {
        TableStatus {
            revision: self.revision,
            draw_pile: self.draw_pile.len(),
            discard_pile: self.discard_pile.len(),
            in_use: self.in_use.clone(),
            hands: self
                .hands
                .iter()
                .map(|(peer, hand)| (peer.clone(), hand.len()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// TableStatus
// ---------------------------------------------------------------------------

/// What the host operator gets to see: sizes and counts, never the order
/// of the draw pile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableStatus {
    /// Revision of the state this snapshot was taken from.
    pub revision: u64,
    /// Cards left in the draw pile.
    pub draw_pile: usize,
    /// Cards waiting in the discard pile.
    pub discard_pile: usize,
    /// Non-zero in-use counts, by type.
    pub in_use: BTreeMap<CardType, u32>,
    /// Hand size per client.
    pub hands: BTreeMap<PeerId, usize>,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "revision: {}", self.revision)?;
        writeln!(f, "cards in draw pile: {}", self.draw_pile)?;
        writeln!(f, "cards in discard pile: {}", self.discard_pile)?;
        writeln!(f, "cards in use:")?;
        for (card_type, count) in &self.in_use {
            writeln!(f, "  \"{card_type}\" {count}")?;
        }
        write!(f, "clients: {}", self.hands.len())?;
        for (peer, cards) in &self.hands {
            write!(f, "\n  {peer}: {cards} cards")?;
        }
        Ok(())
    }
}
