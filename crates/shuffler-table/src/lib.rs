//! The authoritative card table for Shuffler.
//!
//! Everything with real invariants lives here: the piles, the hands, the
//! in-use tally, and the rules that move cards between them. Apart from
//! reading a template file nothing here does I/O or awaits. The host actor
//! calls into it one command at a time and ships whatever it returns.
//!
//! # Key types
//!
//! - [`DeckTemplate`]: how many cards of each type a fresh deck holds
//! - [`SessionState`]: draw pile, discard pile, hand table, in-use tally
//! - [`Table`]: the rules engine that owns a `SessionState` and an RNG
//! - [`TableStatus`]: a read-only snapshot for operators and observers

mod config;
mod error;
mod rules;
mod state;

pub use config::{DeckTemplate, TemplateEntry};
pub use error::TableError;
pub use rules::{Outbound, Table, generate_deck, shuffle};
pub use state::{SessionState, TableStatus};
