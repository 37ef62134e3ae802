//! The rules engine: every way a card can move.
//!
//! [`Table`] owns the [`SessionState`], the [`DeckTemplate`] it was built
//! from, and the random source used for shuffling. Each public method is
//! one transition. Methods that answer a client return the messages to send
//! instead of sending them, the same way a room's game logic hands its
//! output back to the room actor.

use std::mem;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shuffler_protocol::{CardType, ClientMessage, PeerId, ServerMessage};

use crate::{DeckTemplate, SessionState, TableError, TableStatus};

/// Messages produced by a transition, each addressed to one client.
pub type Outbound = Vec<(PeerId, ServerMessage)>;

/// Expands a template into one card per copy, grouped by type in template
/// order. No randomness.
pub fn generate_deck(template: &DeckTemplate) -> Vec<CardType> {
    let mut deck = Vec::with_capacity(template.total_cards());
    for entry in template.entries() {
        for _ in 0..entry.count {
            deck.push(entry.name.clone());
        }
    }
    deck
}

/// Returns a uniformly random permutation of `cards` (Fisher–Yates).
///
/// Walks from the last index down to 1 and swaps each position with a
/// uniformly chosen index in `0..=i`. The input slice is left untouched.
pub fn shuffle<T: Clone, R: Rng>(cards: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = cards.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.random_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

/// The authoritative card table.
pub struct Table<R = StdRng> {
    template: DeckTemplate,
    state: SessionState,
    rng: R,
}

impl Table<StdRng> {
    /// Creates a table with a freshly shuffled deck, seeded from the OS.
    pub fn new(template: DeckTemplate) -> Self {
        Self::with_rng(template, StdRng::from_os_rng())
    }

    /// Creates a table whose shuffles are reproducible.
    pub fn seeded(template: DeckTemplate, seed: u64) -> Self {
        Self::with_rng(template, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Table<R> {
    /// Creates a table using the given random source.
    pub fn with_rng(template: DeckTemplate, mut rng: R) -> Self {
        let draw_pile = shuffle(&generate_deck(&template), &mut rng);
        tracing::debug!(cards = draw_pile.len(), "deck generated");
        Self {
            template,
            state: SessionState {
                draw_pile,
                ..SessionState::default()
            },
            rng,
        }
    }

    /// The template this table deals from.
    pub fn template(&self) -> &DeckTemplate {
        &self.template
    }

    /// Read access to the current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Snapshot of the current state for observers.
    pub fn status(&self) -> TableStatus {
        self.state.status()
    }

    // -- Clients ----------------------------------------------------------

    /// Seats a client with an empty hand.
    pub fn connect(&mut self, peer: PeerId) -> Result<(), TableError> {
        if self.state.hands.contains_key(&peer) {
            return Err(TableError::AlreadyConnected(peer));
        }
        self.state.hands.insert(peer, Vec::new());
        self.touch();
        Ok(())
    }

    /// Handles a client leaving.
    ///
    /// With `reclaim`, the hand entry is removed and its cards go onto the
    /// discard pile, refilling an empty draw pile. Without it, the entry is
    /// left in place and its cards stay out of circulation. Returns the
    /// number of cards reclaimed.
    pub fn disconnect(&mut self, peer: &PeerId, reclaim: bool) -> Result<usize, TableError> {
        if !self.state.hands.contains_key(peer) {
            return Err(TableError::UnknownClient(peer.clone()));
        }
        if !reclaim {
            return Ok(0);
        }

        let hand = self.state.hands.remove(peer).unwrap_or_default();
        let reclaimed = hand.len();
        self.state.discard_pile.extend(hand);
        self.refill_draw_pile();
        self.touch();
        tracing::debug!(%peer, reclaimed, "hand reclaimed");
        Ok(reclaimed)
    }

    // -- Client commands --------------------------------------------------

    /// Applies one client command and returns the responses to send.
    ///
    /// A successful draw or use answers the sender with its full hand. A
    /// draw against two empty piles answers nothing.
    pub fn handle_message(
        &mut self,
        sender: &PeerId,
        msg: ClientMessage,
    ) -> Result<Outbound, TableError> {
        let hand = match msg {
            ClientMessage::DrawCard => self.draw_card(sender)?,
            ClientMessage::UseCard(index) => Some(self.use_card(sender, index)?),
        };
        Ok(hand
            .map(|cards| vec![(sender.clone(), ServerMessage::UpdateCards(cards))])
            .unwrap_or_default())
    }

    /// Moves the top card of the draw pile into the client's hand.
    ///
    /// An empty draw pile is first refilled from the discard pile. Returns
    /// the updated hand, or `None` if there was nothing to draw.
    pub fn draw_card(&mut self, peer: &PeerId) -> Result<Option<Vec<CardType>>, TableError> {
        if !self.state.hands.contains_key(peer) {
            return Err(TableError::UnknownClient(peer.clone()));
        }

        self.refill_draw_pile();
        let Some(card) = self.state.draw_pile.pop() else {
            tracing::debug!(%peer, "draw ignored, no cards left");
            return Ok(None);
        };

        let hand = self
            .state
            .hands
            .get_mut(peer)
            .ok_or_else(|| TableError::UnknownClient(peer.clone()))?;
        hand.push(card);
        let hand = hand.clone();
        self.touch();
        Ok(Some(hand))
    }

    /// Puts the card at `index` of the client's hand into play.
    ///
    /// Removal is positional: later cards shift down by one. Returns the
    /// updated hand.
    pub fn use_card(&mut self, peer: &PeerId, index: i64) -> Result<Vec<CardType>, TableError> {
        let hand = self
            .state
            .hands
            .get_mut(peer)
            .ok_or_else(|| TableError::UnknownClient(peer.clone()))?;

        let position = usize::try_from(index)
            .ok()
            .filter(|&i| i < hand.len())
            .ok_or_else(|| TableError::InvalidIndex {
                peer: peer.clone(),
                index,
                hand_len: hand.len(),
            })?;

        let card = hand.remove(position);
        let hand = hand.clone();
        *self.state.in_use.entry(card).or_insert(0) += 1;
        self.touch();
        Ok(hand)
    }

    // -- Operator actions -------------------------------------------------

    /// Returns one in-use card of `card_type` to the discard pile.
    ///
    /// If the draw pile is empty afterwards, the whole discard pile is
    /// shuffled into a new draw pile. Returns `true` when that happened.
    pub fn discard_used_card(&mut self, card_type: &CardType) -> Result<bool, TableError> {
        let count = self
            .state
            .in_use
            .get_mut(card_type)
            .filter(|count| **count > 0)
            .ok_or_else(|| TableError::NotInUse(card_type.clone()))?;

        *count -= 1;
        if *count == 0 {
            self.state.in_use.remove(card_type);
        }
        self.state.discard_pile.push(card_type.clone());
        let reshuffled = self.refill_draw_pile();
        self.touch();
        Ok(reshuffled)
    }

    /// Starts over with a fresh deck.
    ///
    /// Every hand entry is emptied (entries are kept) and each client is
    /// told so with an empty `updateCards`.
    pub fn reset_deck(&mut self) -> Outbound {
        self.state.draw_pile = shuffle(&generate_deck(&self.template), &mut self.rng);
        self.state.discard_pile.clear();
        self.state.in_use.clear();

        let mut outbound = Vec::with_capacity(self.state.hands.len());
        for (peer, hand) in &mut self.state.hands {
            hand.clear();
            outbound.push((peer.clone(), ServerMessage::UpdateCards(Vec::new())));
        }
        self.touch();
        tracing::info!(
            cards = self.state.draw_pile.len(),
            clients = outbound.len(),
            "deck reset"
        );
        outbound
    }

    // -- Internals --------------------------------------------------------

    /// Shuffles the discard pile into the draw pile if, and only if, the
    /// draw pile is empty and the discard pile is not.
    fn refill_draw_pile(&mut self) -> bool {
        if !self.state.draw_pile.is_empty() || self.state.discard_pile.is_empty() {
            return false;
        }
        let discard = mem::take(&mut self.state.discard_pile);
        self.state.draw_pile = shuffle(&discard, &mut self.rng);
        tracing::debug!(cards = self.state.draw_pile.len(), "discard pile reshuffled");
        true
    }

    fn touch(&mut self) {
        self.state.revision += 1;
    }
}
