//! # Shuffler
//!
//! A host-authoritative card table for small groups.
//!
//! One participant runs the host: it owns the draw pile, the discard pile,
//! every client's hand and the tally of cards in play. Clients connect over
//! WebSocket and send two commands, `drawCard` and `useCard`; after each
//! successful one the host answers with the client's complete hand.
//!
//! ```text
//! client ──drawCard/useCard──→ handler ──HostCommand──→ host actor ──→ Table
//!    ↑                                                      │
//!    └─────────────── updateCards (full hand) ──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shuffler::prelude::*;
//!
//! # async fn start() -> Result<(), ShufflerError> {
//! let host = ShufflerHost::builder()
//!     .bind("0.0.0.0:8080")
//!     .reclaim_on_disconnect(true)
//!     .build()
//!     .await?;
//!
//! let handle = host.handle();
//! tokio::spawn(host.run());
//!
//! // Operator actions go through the handle.
//! handle.reset().await?;
//! # Ok(())
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod client;
mod config;
mod error;
mod handler;
mod host;
mod log;
mod operator;
mod server;

pub use client::{CLIENT_HELP, ClientInput, ClientView, DISCONNECTED, run_client};
pub use config::{DEFAULT_CHANNEL_SIZE, HostConfig};
pub use error::{ParseCommandError, ShufflerError};
pub use host::{HostHandle, PeerSender};
pub use log::{DEFAULT_LOG_CAPACITY, LogEntry, OperatorLog};
pub use operator::{
    COPY_FAILED, Clipboard, OPERATOR_HELP, OperatorAction, SystemClipboard, join_link,
    parse_join_link, run_console,
};
pub use server::{ShufflerHost, ShufflerHostBuilder};

/// Convenience re-exports for the common case.
pub mod prelude {
    pub use crate::{
        Clipboard, HostConfig, HostHandle, ShufflerError, ShufflerHost, ShufflerHostBuilder,
        SystemClipboard,
    };
    pub use shuffler_protocol::{CardType, ClientMessage, ServerMessage};
    pub use shuffler_table::{DeckTemplate, TableStatus};
}
