//! Host actor: the single task that owns the card table.
//!
//! Every event that can change the table arrives here as a [`HostCommand`]
//! on one bounded channel: connection events from the per-connection
//! handlers, and operator actions from the console. The actor handles them
//! one at a time, to completion, so the table never needs a lock.

use std::collections::HashMap;

use shuffler_protocol::{CardType, ClientMessage, PeerId, ServerMessage};
use shuffler_table::{Outbound, Table, TableError, TableStatus};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::Level;

use crate::log::{LogEntry, OperatorLog};
use crate::{HostConfig, ShufflerError};

/// Channel sender for delivering messages to one client's writer task.
pub type PeerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to the host actor through its channel.
///
/// Connection events other than `Connected` are fire-and-forget. Requests
/// carry a `oneshot::Sender` the actor answers on.
pub(crate) enum HostCommand {
    /// A client connected and can be written to through `sender`. Replies
    /// with the table's verdict; a rejected peer is not registered.
    Connected {
        peer: PeerId,
        sender: PeerSender,
        reply: oneshot::Sender<Result<(), TableError>>,
    },

    /// A frame arrived from a client. `msg` is `None` when the frame did
    /// not decode into a known command; `raw` is what was received.
    Inbound {
        peer: PeerId,
        raw: String,
        msg: Option<ClientMessage>,
    },

    /// The client's connection closed.
    Closed { peer: PeerId },

    /// The client's connection reported an error.
    Errored { peer: PeerId, error: String },

    /// Start over with a fresh deck. Replies with the number of clients
    /// that were sent their emptied hand.
    Reset { reply: oneshot::Sender<usize> },

    /// Return one in-use card to the discard pile. Replies with whether
    /// the discard pile was reshuffled into the draw pile.
    Discard {
        card_type: CardType,
        reply: oneshot::Sender<Result<bool, TableError>>,
    },

    /// Request a status snapshot.
    Status { reply: oneshot::Sender<TableStatus> },

    /// Request the operator log, newest first.
    Logs { reply: oneshot::Sender<Vec<LogEntry>> },

    /// Append a line to the operator log.
    Note { level: Level, text: String },

    /// Stop the actor.
    Shutdown,
}

/// Handle to the running host actor.
///
/// Cheap to clone: an `mpsc::Sender` plus a `watch::Receiver`.
#[derive(Clone)]
pub struct HostHandle {
    sender: mpsc::Sender<HostCommand>,
    status: watch::Receiver<TableStatus>,
}

impl HostHandle {
    /// Registers a peer.
    ///
    /// # Errors
    /// [`TableError::AlreadyConnected`] (wrapped) if the id is taken. The
    /// caller must then drop the connection without reporting a close.
    pub(crate) async fn connected(
        &self,
        peer: PeerId,
        sender: PeerSender,
    ) -> Result<(), ShufflerError> {
        let result = self
            .request(|reply| HostCommand::Connected {
                peer,
                sender,
                reply,
            })
            .await?;
        Ok(result?)
    }

    pub(crate) async fn inbound(
        &self,
        peer: PeerId,
        raw: String,
        msg: Option<ClientMessage>,
    ) -> Result<(), ShufflerError> {
        self.send(HostCommand::Inbound { peer, raw, msg }).await
    }

    pub(crate) async fn errored(&self, peer: PeerId, error: String) -> Result<(), ShufflerError> {
        self.send(HostCommand::Errored { peer, error }).await
    }

    /// Non-async variant used from `Drop`.
    pub(crate) fn closed_now(&self, peer: PeerId) -> Result<(), ShufflerError> {
        let sender = self.sender.clone();
        match sender.try_send(HostCommand::Closed { peer }) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(cmd)) => {
                tokio::spawn(async move {
                    let _ = sender.send(cmd).await;
                });
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ShufflerError::HostUnavailable),
        }
    }

    /// Regenerates and reshuffles the deck and empties every hand.
    ///
    /// Returns how many connected clients were notified.
    pub async fn reset(&self) -> Result<usize, ShufflerError> {
        self.request(|reply| HostCommand::Reset { reply }).await
    }

    /// Returns one in-use card of `card_type` to the discard pile.
    ///
    /// Returns `true` if the discard pile was shuffled into an empty draw
    /// pile as a result.
    ///
    /// # Errors
    /// [`TableError::NotInUse`] (wrapped) if no card of that type is in use.
    pub async fn discard(&self, card_type: impl Into<CardType>) -> Result<bool, ShufflerError> {
        let card_type = card_type.into();
        let result = self
            .request(|reply| HostCommand::Discard { card_type, reply })
            .await?;
        Ok(result?)
    }

    /// Fetches a fresh status snapshot from the actor.
    pub async fn status(&self) -> Result<TableStatus, ShufflerError> {
        self.request(|reply| HostCommand::Status { reply }).await
    }

    /// Fetches the operator log, newest first.
    pub async fn logs(&self) -> Result<Vec<LogEntry>, ShufflerError> {
        self.request(|reply| HostCommand::Logs { reply }).await
    }

    /// Appends a line to the operator log.
    pub async fn note(&self, level: Level, text: impl Into<String>) -> Result<(), ShufflerError> {
        self.send(HostCommand::Note {
            level,
            text: text.into(),
        })
        .await
    }

    /// Subscribes to status snapshots, published after every change.
    pub fn subscribe(&self) -> watch::Receiver<TableStatus> {
        self.status.clone()
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), ShufflerError> {
        self.send(HostCommand::Shutdown).await
    }

    /// Completes once the actor has stopped.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }

    async fn send(&self, cmd: HostCommand) -> Result<(), ShufflerError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| ShufflerError::HostUnavailable)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> HostCommand,
    ) -> Result<T, ShufflerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx.await.map_err(|_| ShufflerError::HostUnavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct HostActor {
    table: Table,
    /// Outbound channels of currently connected clients.
    senders: HashMap<PeerId, PeerSender>,
    log: OperatorLog,
    reclaim_on_disconnect: bool,
    status_tx: watch::Sender<TableStatus>,
    receiver: mpsc::Receiver<HostCommand>,
}

impl HostActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!("host actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                HostCommand::Connected {
                    peer,
                    sender,
                    reply,
                } => {
                    let result = self.handle_connected(peer, sender);
                    let _ = reply.send(result);
                }
                HostCommand::Inbound { peer, raw, msg } => {
                    self.handle_inbound(peer, raw, msg);
                }
                HostCommand::Closed { peer } => {
                    self.handle_closed(peer);
                }
                HostCommand::Errored { peer, error } => {
                    self.log
                        .warn(format!("Connection error! ID: {peer}, Error: {error}."));
                }
                HostCommand::Reset { reply } => {
                    let notified = self.handle_reset();
                    let _ = reply.send(notified);
                }
                HostCommand::Discard { card_type, reply } => {
                    let result = self.handle_discard(&card_type);
                    let _ = reply.send(result);
                }
                HostCommand::Status { reply } => {
                    let _ = reply.send(self.table.status());
                }
                HostCommand::Logs { reply } => {
                    let _ = reply.send(self.log.entries().cloned().collect());
                }
                HostCommand::Note { level, text } => {
                    self.log.push(level, text);
                }
                HostCommand::Shutdown => {
                    tracing::info!("host shutting down");
                    break;
                }
            }
            self.publish();
        }

        tracing::info!("host actor stopped");
    }

    fn handle_connected(&mut self, peer: PeerId, sender: PeerSender) -> Result<(), TableError> {
        match self.table.connect(peer.clone()) {
            Ok(()) => {
                self.senders.insert(peer.clone(), sender);
                self.log.info(format!("New connection! ID: {peer}."));
                Ok(())
            }
            Err(e) => {
                self.log.warn(format!("Rejected connection: {e}."));
                Err(e)
            }
        }
    }

    fn handle_inbound(&mut self, peer: PeerId, raw: String, msg: Option<ClientMessage>) {
        match msg {
            Some(msg) => match self.table.handle_message(&peer, msg) {
                Ok(outbound) => {
                    self.dispatch(outbound);
                }
                Err(TableError::UnknownClient(_)) => {
                    self.log
                        .warn(format!("Attempted to get cards of unknown client. ID: {peer}."));
                }
                Err(TableError::InvalidIndex { .. }) => {
                    self.log
                        .warn(format!("Attempted to use card with invalid index. ID: {peer}."));
                }
                Err(e) => {
                    self.log.warn(e.to_string());
                }
            },
            None => {
                self.log.warn("Received unknown message from client!");
            }
        }

        self.log
            .info(format!("Received data from {peer}. Data: {raw}."));
    }

    fn handle_closed(&mut self, peer: PeerId) {
        self.senders.remove(&peer);
        self.log.info(format!("Connection closed! ID: {peer}."));

        match self.table.disconnect(&peer, self.reclaim_on_disconnect) {
            Ok(0) => {}
            Ok(reclaimed) => {
                self.log.info(format!(
                    "Returned {reclaimed} cards of {peer} to the discard pile."
                ));
            }
            Err(e) => {
                tracing::debug!(%peer, error = %e, "close for client without hand");
            }
        }
    }

    fn handle_reset(&mut self) -> usize {
        let outbound = self.table.reset_deck();
        let notified = self.dispatch(outbound);
        self.log.info(format!(
            "Deck reset. {} cards in draw pile.",
            self.table.state().draw_pile().len()
        ));
        notified
    }

    fn handle_discard(&mut self, card_type: &CardType) -> Result<bool, TableError> {
        let reshuffled = match self.table.discard_used_card(card_type) {
            Ok(reshuffled) => reshuffled,
            Err(e) => {
                self.log.warn(format!("Rejected discard: {e}."));
                return Err(e);
            }
        };
        self.log.info(format!("Discarded one \"{card_type}\"."));
        if reshuffled {
            self.log.info(format!(
                "Draw pile empty, shuffled {} discarded cards back in.",
                self.table.state().draw_pile().len()
            ));
        }
        Ok(reshuffled)
    }

    /// Delivers outbound messages, returning how many reached a connected
    /// client.
    fn dispatch(&self, outbound: Outbound) -> usize {
        outbound
            .into_iter()
            .filter(|(peer, msg)| self.send_to(peer, msg.clone()))
            .count()
    }

    /// Sends a message to a single client. Silently drops it if the client
    /// is no longer connected.
    fn send_to(&self, peer: &PeerId, msg: ServerMessage) -> bool {
        match self.senders.get(peer) {
            Some(sender) => sender.send(msg).is_ok(),
            None => false,
        }
    }

    /// Publishes a new status snapshot if the table changed.
    fn publish(&self) {
        let revision = self.table.state().revision();
        if self.status_tx.borrow().revision != revision {
            self.status_tx.send_replace(self.table.status());
        }
    }
}

/// Spawns the host actor and returns a handle to communicate with it.
///
/// `host_id` is the identifier clients use to reach this host, if the
/// transport has one yet.
pub(crate) fn spawn_host(config: &HostConfig, host_id: Option<&str>) -> HostHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let table = match config.seed {
        Some(seed) => Table::seeded(config.deck.clone(), seed),
        None => Table::new(config.deck.clone()),
    };
    let (status_tx, status_rx) = watch::channel(table.status());

    let mut log = OperatorLog::new(config.log_capacity);
    if let Some(id) = host_id {
        log.info(format!("Socket open! ID: {id}."));
    }

    let actor = HostActor {
        table,
        senders: HashMap::new(),
        log,
        reclaim_on_disconnect: config.reclaim_on_disconnect,
        status_tx,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    HostHandle {
        sender: tx,
        status: status_rx,
    }
}
