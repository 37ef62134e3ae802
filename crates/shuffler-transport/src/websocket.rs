//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The same [`WebSocketConnection`] type serves both ends: the host gets
//! one per accepted socket, a client gets one from [`WebSocketConnection::connect`].
//! The socket is split so a writer task can send while a reader is parked
//! in `recv`.

use std::net::SocketAddr;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, PeerId, Transport, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;

        let ws = tokio_tungstenite::accept_async(MaybeTlsStream::Plain(stream))
            .await
            .map_err(|e| TransportError::Handshake {
                remote: addr.to_string(),
                reason: e.to_string(),
            })?;

        let peer_id = PeerId::generate();
        tracing::debug!(%peer_id, %addr, "accepted WebSocket connection");

        Ok(WebSocketConnection::from_stream(peer_id, ws))
    }

    fn host_id(&self) -> Option<String> {
        self.local_addr().ok().map(|addr| addr.to_string())
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    peer_id: PeerId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// Dials a host. `host_id` is either a `host:port` pair or a full
    /// `ws://` / `wss://` URL. The remote peer id of the returned
    /// connection is the host id itself.
    pub async fn connect(host_id: &str) -> Result<Self, TransportError> {
        let url = if host_id.starts_with("ws://") || host_id.starts_with("wss://")
        {
            host_id.to_string()
        } else {
            format!("ws://{host_id}")
        };

        let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                addr: url.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(%url, "connected to host");
        Ok(Self::from_stream(PeerId::new(host_id), ws))
    }

    fn send_error(&self, e: tokio_tungstenite::tungstenite::Error) -> TransportError {
        TransportError::Send {
            peer: self.peer_id.clone(),
            reason: e.to_string(),
        }
    }

    fn from_stream(peer_id: PeerId, ws: WsStream) -> Self {
        let (sink, stream) = ws.split();
        Self {
            peer_id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| self.send_error(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::Receive {
                        peer: self.peer_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| self.send_error(e))
    }

    fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }
}
