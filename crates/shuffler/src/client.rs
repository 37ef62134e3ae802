//! Client coordinator: mirrors the hand the host last sent.
//!
//! The client never computes hand state. It shows what arrived in the
//! latest `updateCards`, remembers which card the user selected, and turns
//! user input into exactly two commands: `drawCard` and `useCard`.

use std::fmt;
use std::str::FromStr;

use shuffler_protocol::{CardType, ClientMessage, Codec, JsonCodec, ServerMessage};
use shuffler_transport::{Connection, WebSocketConnection};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ParseCommandError;
use crate::ShufflerError;

/// Shown once the host connection is gone.
pub const DISCONNECTED: &str = "disconnected! either join from another link or host yourself.";

// ---------------------------------------------------------------------------
// ClientView
// ---------------------------------------------------------------------------

/// The client's local picture: held cards and the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientView {
    cards: Vec<CardType>,
    selected: Option<usize>,
}

impl ClientView {
    /// Cards currently held, in hand order.
    pub fn cards(&self) -> &[CardType] {
        &self.cards
    }

    /// Index of the selected card, if any.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Applies a host message. `updateCards` replaces the hand wholesale
    /// and clears the selection.
    pub fn apply(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::UpdateCards(cards) => {
                self.cards = cards;
                self.selected = None;
            }
        }
    }

    /// Selects the card at `index`, or deselects it if it already is.
    ///
    /// Returns the new selection.
    pub fn toggle_select(&mut self, index: usize) -> Result<Option<usize>, ShufflerError> {
        if index >= self.cards.len() {
            return Err(ShufflerError::InvalidSelection {
                index,
                hand_len: self.cards.len(),
            });
        }
        self.selected = if self.selected == Some(index) {
            None
        } else {
            Some(index)
        };
        Ok(self.selected)
    }

    /// The command for drawing a card.
    pub fn draw_command(&self) -> ClientMessage {
        ClientMessage::DrawCard
    }

    /// The command for using the selected card.
    ///
    /// # Errors
    /// [`ShufflerError::NoSelection`] when nothing is selected. Nothing
    /// should be sent in that case.
    pub fn use_command(&self) -> Result<ClientMessage, ShufflerError> {
        let index = self.selected.ok_or(ShufflerError::NoSelection)?;
        let index = i64::try_from(index).map_err(|_| ShufflerError::InvalidSelection {
            index,
            hand_len: self.cards.len(),
        })?;
        Ok(ClientMessage::UseCard(index))
    }
}

impl fmt::Display for ClientView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cards.is_empty() {
            return f.write_str("held cards: none");
        }
        write!(f, "held cards:")?;
        for (i, card) in self.cards.iter().enumerate() {
            let marker = if self.selected == Some(i) { '*' } else { ' ' };
            write!(f, "\n {marker}{i}: \"{card}\"")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Console input
// ---------------------------------------------------------------------------

/// One line typed at the client console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientInput {
    /// Ask the host for a card.
    Draw,
    /// Toggle selection of the card at this index.
    Select(usize),
    /// Use the selected card.
    Use,
    /// Print the held cards.
    Hand,
    /// Print the command list.
    Help,
    /// Disconnect and leave.
    Quit,
}

impl FromStr for ClientInput {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let word = words.next().unwrap_or_default();

        match word {
            "draw" => Ok(Self::Draw),
            "select" => words
                .next()
                .and_then(|n| n.parse().ok())
                .map(Self::Select)
                .ok_or(ParseCommandError::Usage("select <index>")),
            "use" => Ok(Self::Use),
            "hand" => Ok(Self::Hand),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

/// Command list printed by `help`.
pub const CLIENT_HELP: &str = "\
commands:
  draw              draw a card from the host's pile
  select <index>    select the card at <index>, again to deselect
  use               use the selected card
  hand              show held cards
  help              show this list
  quit              disconnect";

// ---------------------------------------------------------------------------
// run_client
// ---------------------------------------------------------------------------

/// Joins `host_id` and runs the client console until the user quits, input
/// ends, or the host goes away.
///
/// # Errors
/// [`ShufflerError::MissingHostId`] without a host id. Connection failures
/// are returned as transport errors. Losing the connection later is not an
/// error: the disconnect message is printed and the function returns.
pub async fn run_client<R, W>(host_id: Option<&str>, input: R, mut output: W) -> Result<(), ShufflerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let host_id = host_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ShufflerError::MissingHostId)?;

    let conn = WebSocketConnection::connect(host_id).await?;
    let codec = JsonCodec;
    let mut view = ClientView::default();
    let mut lines = input.lines();

    tracing::info!(%host_id, "joined host");
    write_line(&mut output, &format!("joined {host_id}\n{CLIENT_HELP}")).await?;

    loop {
        tokio::select! {
            frame = conn.recv() => match frame {
                Ok(Some(data)) => match codec.decode::<ServerMessage>(&data) {
                    Ok(msg) => {
                        view.apply(msg);
                        write_line(&mut output, &view.to_string()).await?;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Received unknown message from host!");
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "host connection failed");
                    break;
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    let _ = conn.close().await;
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }

                let outgoing = match line.parse::<ClientInput>() {
                    Ok(ClientInput::Draw) => Ok(view.draw_command()),
                    Ok(ClientInput::Use) => view.use_command(),
                    Ok(ClientInput::Select(index)) => {
                        let reply = match view.toggle_select(index) {
                            Ok(Some(i)) => format!("selected card {i}"),
                            Ok(None) => "selection cleared".to_string(),
                            Err(e) => format!("error: {e}"),
                        };
                        write_line(&mut output, &reply).await?;
                        continue;
                    }
                    Ok(ClientInput::Hand) => {
                        write_line(&mut output, &view.to_string()).await?;
                        continue;
                    }
                    Ok(ClientInput::Help) => {
                        write_line(&mut output, CLIENT_HELP).await?;
                        continue;
                    }
                    Ok(ClientInput::Quit) => {
                        let _ = conn.close().await;
                        return Ok(());
                    }
                    Err(e) => {
                        write_line(&mut output, &format!("{e}\n{CLIENT_HELP}")).await?;
                        continue;
                    }
                };

                match outgoing {
                    Ok(msg) => {
                        let bytes = codec.encode(&msg)?;
                        if let Err(e) = conn.send(&bytes).await {
                            tracing::debug!(error = %e, "send to host failed");
                        }
                    }
                    Err(e) => write_line(&mut output, &format!("error: {e}")).await?,
                }
            }
        }
    }

    tracing::info!(%host_id, "host connection closed");
    write_line(&mut output, DISCONNECTED).await?;
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), ShufflerError> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
