//! Host configuration.

use serde::{Deserialize, Serialize};
use shuffler_table::DeckTemplate;

use crate::log::DEFAULT_LOG_CAPACITY;

/// Default command channel size for the host actor.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Configuration for a [`ShufflerHost`](crate::ShufflerHost).
///
/// Every field has a default, so a config file only needs to name what it
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Origin that join links are built from.
    pub public_url: String,

    /// The deck every session starts from.
    pub deck: DeckTemplate,

    /// When a client disconnects, move its hand to the discard pile and
    /// forget it. When `false`, the hand stays on the table untouched.
    pub reclaim_on_disconnect: bool,

    /// Fixed seed for shuffling. `None` seeds from the OS.
    pub seed: Option<u64>,

    /// Number of operator log entries kept.
    pub log_capacity: usize,

    /// Bound on queued actor commands before senders wait.
    pub channel_size: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
            deck: DeckTemplate::default(),
            reclaim_on_disconnect: true,
            seed: None,
            log_capacity: DEFAULT_LOG_CAPACITY,
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }
}
