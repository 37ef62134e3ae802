//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on a random local port and talk to it,
//! once with a raw `tokio-tungstenite` client and once with our own
//! [`WebSocketConnection::connect`].

#[cfg(feature = "websocket")]
mod websocket {
    use shuffler_transport::{
        Connection, Transport, WebSocketConnection, WebSocketTransport,
    };

    async fn bind_random() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.host_id().expect("bound transport has an id");
        (transport, addr)
    }

    #[tokio::test]
    async fn test_host_id_is_local_addr() {
        let (transport, addr) = bind_random().await;
        assert_eq!(addr, transport.local_addr().unwrap().to_string());
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, addr) = bind_random().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let url = format!("ws://{addr}");
        let (mut client_ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");

        let server_conn = server_handle.await.expect("task should complete");
        assert_eq!(server_conn.peer_id().as_str().len(), 16);

        // Server sends, client receives.
        server_conn
            .send(b"hello from host")
            .await
            .expect("send should succeed");

        use futures_util::StreamExt;
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello from host");

        // Client sends a text frame, server still gets bytes.
        use futures_util::SinkExt;
        use tokio_tungstenite::tungstenite::Message;
        client_ws
            .send(Message::Text(r#"{"name":"drawCard"}"#.into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"name":"drawCard"}"#);

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_connect_round_trip_between_two_connections() {
        let (mut transport, addr) = bind_random().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let client = WebSocketConnection::connect(&addr)
            .await
            .expect("should connect");
        assert_eq!(client.peer_id().as_str(), addr);

        let host_side = server_handle.await.unwrap();

        client.send(b"ping").await.unwrap();
        assert_eq!(host_side.recv().await.unwrap().unwrap(), b"ping");

        host_side.send(b"pong").await.unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"pong");
    }

    #[tokio::test]
    async fn test_send_while_recv_is_pending() {
        // The reader holds only the stream half, so a concurrent send
        // on the same connection must not wait for inbound traffic.
        let (mut transport, addr) = bind_random().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = WebSocketConnection::connect(&addr).await.unwrap();
        let host_side = std::sync::Arc::new(server_handle.await.unwrap());

        let reader = {
            let host_side = std::sync::Arc::clone(&host_side);
            tokio::spawn(async move { host_side.recv().await })
        };
        tokio::task::yield_now().await;

        tokio::time::timeout(
            std::time::Duration::from_secs(2),
            host_side.send(b"unblocked"),
        )
        .await
        .expect("send must not block behind recv")
        .unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"unblocked");

        client.send(b"done").await.unwrap();
        assert_eq!(reader.await.unwrap().unwrap().unwrap(), b"done");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_peer_close() {
        let (mut transport, addr) = bind_random().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = WebSocketConnection::connect(&addr).await.unwrap();
        let host_side = server_handle.await.unwrap();

        client.close().await.unwrap();

        let result = host_side.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let (transport, addr) = bind_random().await;
        drop(transport);

        let result = WebSocketConnection::connect(&addr).await;
        assert!(result.is_err());
    }
}
