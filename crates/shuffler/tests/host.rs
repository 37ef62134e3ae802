//! Integration tests for the host over real WebSocket connections.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use shuffler::prelude::*;
use shuffler::{DISCONNECTED, run_client};
use shuffler_transport::{Connection, Transport, WebSocketTransport};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a host on a random port and returns its address and handle.
async fn start_host(pairs: &[(&str, u32)], reclaim: bool) -> (String, HostHandle) {
    let deck = DeckTemplate::from_pairs(pairs.iter().copied()).expect("valid deck");
    let host = ShufflerHost::builder()
        .bind("127.0.0.1:0")
        .deck(deck)
        .seed(7)
        .reclaim_on_disconnect(reclaim)
        .build()
        .await
        .expect("host should build");

    let addr = host.local_addr().expect("should have local addr").to_string();
    assert_eq!(host.host_id(), Some(addr.as_str()));
    let handle = host.handle();

    tokio::spawn(async move {
        let _ = host.run().await;
    });

    (addr, handle)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).expect("encode");
    ws.send(Message::Text(json.into())).await.expect("send");
}

async fn send_raw(ws: &mut ClientWs, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.expect("send");
}

async fn recv_hand(ws: &mut ClientWs) -> Vec<CardType> {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for host")
        .expect("stream ended")
        .expect("recv");
    let ServerMessage::UpdateCards(cards) =
        serde_json::from_slice(&msg.into_data()).expect("decode");
    cards
}

/// Asserts nothing arrives for a short while.
async fn expect_silence(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(100), ws.next()).await;
    assert!(result.is_err(), "expected no message, got {result:?}");
}

/// Waits until the published status satisfies `pred`.
async fn wait_for_status(handle: &HostHandle, pred: impl Fn(&TableStatus) -> bool) -> TableStatus {
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            {
                let status = rx.borrow_and_update();
                if pred(&status) {
                    return status.clone();
                }
            }
            rx.changed().await.expect("host stopped");
        }
    })
    .await
    .expect("timed out waiting for status")
}

async fn wait_for_log(handle: &HostHandle, text: &str) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let logs = handle.logs().await.expect("logs");
            if logs.iter().any(|e| e.text.contains(text)) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for log line {text:?}"));
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_full_cycle_over_websocket() {
    let (addr, handle) = start_host(&[("A", 2), ("B", 1)], true).await;
    let mut ws = connect(&addr).await;

    for expected in 1..=3 {
        send(&mut ws, &ClientMessage::DrawCard).await;
        assert_eq!(recv_hand(&mut ws).await.len(), expected);
    }

    // Both piles empty: the draw is ignored and nothing comes back.
    send(&mut ws, &ClientMessage::DrawCard).await;
    expect_silence(&mut ws).await;

    send(&mut ws, &ClientMessage::UseCard(0)).await;
    assert_eq!(recv_hand(&mut ws).await.len(), 2);

    let status = handle.status().await.unwrap();
    let (used, _) = status.in_use.iter().next().expect("one type in use");
    let used = used.clone();

    assert!(handle.discard(used.clone()).await.unwrap());

    let status = handle.status().await.unwrap();
    assert_eq!(status.draw_pile, 1);
    assert_eq!(status.discard_pile, 0);
    assert!(status.in_use.is_empty());

    // The reshuffled card is drawable again.
    send(&mut ws, &ClientMessage::DrawCard).await;
    assert!(recv_hand(&mut ws).await.contains(&used));
}

#[tokio::test]
async fn test_bad_frames_keep_connection_open() {
    let (addr, handle) = start_host(&[("A", 3)], true).await;
    let mut ws = connect(&addr).await;

    send_raw(&mut ws, "definitely not json").await;
    send_raw(&mut ws, r#"{"name":"shout","data":1}"#).await;
    send(&mut ws, &ClientMessage::DrawCard).await;

    assert_eq!(recv_hand(&mut ws).await, vec![CardType::from("A")]);
    wait_for_log(&handle, "Received unknown message from client!").await;
    wait_for_log(&handle, r#"Data: {"name":"shout","data":1}."#).await;
}

#[tokio::test]
async fn test_invalid_index_gets_no_reply() {
    let (addr, handle) = start_host(&[("A", 3)], true).await;
    let mut ws = connect(&addr).await;

    send(&mut ws, &ClientMessage::UseCard(-1)).await;
    send(&mut ws, &ClientMessage::UseCard(0)).await;
    send(&mut ws, &ClientMessage::DrawCard).await;

    // The first reply is the draw.
    assert_eq!(recv_hand(&mut ws).await.len(), 1);
    wait_for_log(&handle, "Attempted to use card with invalid index.").await;
    assert!(handle.status().await.unwrap().in_use.is_empty());
}

#[tokio::test]
async fn test_reset_pushes_empty_hand_to_every_client() {
    let (addr, handle) = start_host(&[("A", 4)], true).await;
    let mut ws1 = connect(&addr).await;
    let mut ws2 = connect(&addr).await;

    send(&mut ws1, &ClientMessage::DrawCard).await;
    recv_hand(&mut ws1).await;
    send(&mut ws2, &ClientMessage::DrawCard).await;
    recv_hand(&mut ws2).await;

    let notified = handle.reset().await.unwrap();

    assert_eq!(notified, 2);
    assert!(recv_hand(&mut ws1).await.is_empty());
    assert!(recv_hand(&mut ws2).await.is_empty());
    assert_eq!(handle.status().await.unwrap().draw_pile, 4);
}

#[tokio::test]
async fn test_disconnect_reclaims_hand() {
    let (addr, handle) = start_host(&[("A", 3)], true).await;
    let mut ws = connect(&addr).await;
    send(&mut ws, &ClientMessage::DrawCard).await;
    recv_hand(&mut ws).await;
    send(&mut ws, &ClientMessage::DrawCard).await;
    recv_hand(&mut ws).await;

    ws.close(None).await.expect("close");

    let status = wait_for_status(&handle, |s| s.revision > 0 && s.hands.is_empty()).await;
    assert_eq!(status.draw_pile + status.discard_pile, 3);
    wait_for_log(&handle, "Connection closed!").await;
}

#[tokio::test]
async fn test_disconnect_without_reclaim_keeps_hand() {
    let (addr, handle) = start_host(&[("A", 3)], false).await;
    let mut ws = connect(&addr).await;
    send(&mut ws, &ClientMessage::DrawCard).await;
    recv_hand(&mut ws).await;

    drop(ws);
    wait_for_log(&handle, "Connection closed!").await;

    let status = handle.status().await.unwrap();
    assert_eq!(status.hands.values().copied().collect::<Vec<_>>(), vec![1]);
    assert_eq!(status.draw_pile, 2);
}

#[tokio::test]
async fn test_shutdown_stops_accept_loop() {
    let deck = DeckTemplate::from_pairs([("A", 1)]).unwrap();
    let host = ShufflerHost::builder()
        .bind("127.0.0.1:0")
        .deck(deck)
        .build()
        .await
        .unwrap();
    let handle = host.handle();
    let running = tokio::spawn(host.run());

    handle.shutdown().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("run should return")
        .expect("task should not panic");
    assert!(result.is_ok());
}

// =========================================================================
// Client coordinator
// =========================================================================

#[tokio::test]
async fn test_client_console_draws_and_uses() {
    let (addr, _handle) = start_host(&[("A", 2)], true).await;
    let (mut keys, input) = tokio::io::duplex(1024);
    let (screen, output) = tokio::io::duplex(4096);
    let mut screen = BufReader::new(screen).lines();

    let client = tokio::spawn(async move { run_client(Some(addr.as_str()), BufReader::new(input), output).await });

    async fn wait_for_line(
        lines: &mut tokio::io::Lines<BufReader<tokio::io::DuplexStream>>,
        want: &str,
    ) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(line) = lines.next_line().await.expect("read screen") {
                if line == want {
                    return;
                }
            }
            panic!("screen closed before {want:?}");
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {want:?}"));
    }

    keys.write_all(b"draw\n").await.unwrap();
    wait_for_line(&mut screen, "  0: \"A\"").await;

    keys.write_all(b"use\n").await.unwrap();
    wait_for_line(&mut screen, "error: no card selected").await;

    keys.write_all(b"select 0\nuse\n").await.unwrap();
    wait_for_line(&mut screen, "selected card 0").await;
    wait_for_line(&mut screen, "held cards: none").await;

    keys.write_all(b"quit\n").await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), client)
        .await
        .expect("client should exit")
        .expect("task should not panic");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_client_shows_disconnect_when_host_closes() {
    let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
    let host_id = transport.host_id().unwrap();
    tokio::spawn(async move {
        let conn = transport.accept().await.unwrap();
        let _ = conn.close().await;
    });

    let (_keys, input) = tokio::io::duplex(64);
    let mut output = Vec::new();

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        run_client(Some(host_id.as_str()), BufReader::new(input), &mut output),
    )
    .await
    .expect("client should notice the close");

    assert!(result.is_ok());
    let screen = String::from_utf8(output).unwrap();
    assert!(screen.trim_end().ends_with(DISCONNECTED));
}

#[tokio::test]
async fn test_client_connect_failure_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let (_keys, input) = tokio::io::duplex(64);
    let result = run_client(Some(addr.as_str()), BufReader::new(input), Vec::new()).await;

    assert!(matches!(result, Err(ShufflerError::Transport(_))));
}
