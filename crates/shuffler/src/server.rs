//! `ShufflerHost` builder and accept loop.
//!
//! This is the entry point for running a host. It ties the layers together:
//! transport → protocol → host actor → table.

use std::net::SocketAddr;

use shuffler_protocol::JsonCodec;
use shuffler_table::DeckTemplate;
use shuffler_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::host::spawn_host;
use crate::operator::join_link;
use crate::{HostConfig, HostHandle, ShufflerError};

/// Builder for configuring and starting a host.
///
/// # Example
///
/// ```rust,no_run
/// use shuffler::prelude::*;
///
/// # async fn start() -> Result<(), ShufflerError> {
/// let host = ShufflerHost::builder()
///     .bind("0.0.0.0:8080")
///     .public_url("https://cards.example.com")
///     .build()
///     .await?;
/// println!("join at {}", host.join_link());
/// host.run().await
/// # }
/// ```
pub struct ShufflerHostBuilder {
    config: HostConfig,
}

impl ShufflerHostBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: HostConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the origin join links are built from.
    pub fn public_url(mut self, url: &str) -> Self {
        self.config.public_url = url.to_string();
        self
    }

    /// Sets the deck template.
    pub fn deck(mut self, deck: DeckTemplate) -> Self {
        self.config.deck = deck;
        self
    }

    /// Chooses whether a departing client's hand returns to circulation.
    pub fn reclaim_on_disconnect(mut self, reclaim: bool) -> Self {
        self.config.reclaim_on_disconnect = reclaim;
        self
    }

    /// Makes every shuffle reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Sets how many operator log entries are kept.
    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.config.log_capacity = capacity;
        self
    }

    /// Binds the transport and starts the host actor.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<ShufflerHost, ShufflerError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let host_id = transport.host_id();
        let handle = spawn_host(&self.config, host_id.as_deref());

        Ok(ShufflerHost {
            transport,
            handle,
            codec: JsonCodec,
            host_id,
            public_url: self.config.public_url,
        })
    }
}

impl Default for ShufflerHostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound host, ready to accept clients.
///
/// Call [`run()`](Self::run) to start accepting connections. Use
/// [`handle()`](Self::handle) beforehand to keep a way of driving operator
/// actions.
pub struct ShufflerHost {
    transport: WebSocketTransport,
    handle: HostHandle,
    codec: JsonCodec,
    host_id: Option<String>,
    public_url: String,
}

impl ShufflerHost {
    /// Creates a new builder.
    pub fn builder() -> ShufflerHostBuilder {
        ShufflerHostBuilder::new()
    }

    /// Returns a handle to the host actor.
    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }

    /// The identifier clients connect with.
    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The link a client opens to join this host.
    pub fn join_link(&self) -> String {
        join_link(&self.public_url, self.host_id())
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task per accepted connection. Returns once the host
    /// actor has been shut down.
    pub async fn run(mut self) -> Result<(), ShufflerError> {
        tracing::info!(host_id = ?self.host_id, "shuffler host running");

        loop {
            let accepted = tokio::select! {
                accepted = self.transport.accept() => accepted,
                () = self.handle.closed() => break,
            };

            match accepted {
                Ok(conn) => {
                    let host = self.handle.clone();
                    let codec = self.codec;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, host, codec).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }

        tracing::info!("shuffler host stopped");
        Ok(())
    }
}
