//! Per-connection handler: decode inbound frames, write outbound ones.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!   1. Register the peer with the host actor, handing it an outbound channel;
//!      a rejected peer is closed straight away
//!   2. Spawn a writer task that drains that channel onto the socket
//!   3. Loop: receive frames → decode into `ClientMessage` → forward to the host
//!   4. On close or error, the guard tells the host the peer is gone

use std::sync::Arc;

use shuffler_protocol::{ClientMessage, Codec, PeerId, ServerMessage};
use shuffler_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::{HostHandle, ShufflerError};

/// Drop guard that reports the peer as closed when the handler exits.
///
/// Runs even if the handler returns early with an error, so the host never
/// keeps a sender for a dead connection.
struct PeerGuard {
    peer: PeerId,
    host: HostHandle,
}

impl Drop for PeerGuard {
    fn drop(&mut self) {
        if self.host.closed_now(self.peer.clone()).is_err() {
            tracing::debug!(peer = %self.peer, "host gone before close was reported");
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    host: HostHandle,
    codec: C,
) -> Result<(), ShufflerError>
where
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let peer = conn.peer_id().clone();
    tracing::debug!(%peer, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    if let Err(e) = host.connected(peer.clone(), tx).await {
        // No guard yet: a rejected peer must not report a close.
        let _ = conn.close().await;
        return Err(e);
    }
    let _guard = PeerGuard {
        peer: peer.clone(),
        host: host.clone(),
    };

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), rx, codec.clone()));

    loop {
        match conn.recv().await {
            Ok(Some(data)) => {
                let raw = String::from_utf8_lossy(&data).into_owned();
                let msg = match codec.decode::<ClientMessage>(&data) {
                    Ok(msg) => Some(msg),
                    Err(e) => {
                        tracing::debug!(%peer, error = %e, "undecodable client frame");
                        None
                    }
                };
                host.inbound(peer.clone(), raw, msg).await?;
            }
            Ok(None) => {
                tracing::info!(%peer, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%peer, error = %e, "recv error");
                host.errored(peer.clone(), e.to_string()).await?;
                break;
            }
        }
    }

    writer.abort();
    // _guard drops here → host sees the close.
    Ok(())
}

/// Drains one peer's outbound channel onto its socket.
///
/// Ends when the host drops the sender or a send fails.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    codec: C,
) {
    let peer = conn.peer_id().clone();
    while let Some(msg) = rx.recv().await {
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%peer, error = %e, "failed to encode message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%peer, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
