//! End-to-end tests: real axum listener, real WebSocket clients.

use std::net::SocketAddr;
use std::time::Duration;

use bookswap_chat::{ChatHandle, ChatServer};
use bookswap_config::ChatConfig;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

type Client = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Start a chat server on a random port and return its address and hub handle.
async fn start_server() -> (SocketAddr, ChatHandle) {
    let server = ChatServer::new(ChatConfig::default()).expect("chat server");
    let handle = server.handle();
    let app: axum::Router = server.router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/chat"))
        .await
        .expect("connect");
    ws
}

/// Read the next JSON text frame, failing after two seconds.
async fn next_json(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("ws error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Assert nothing arrives within a short window.
async fn expect_silence(ws: &mut Client) {
    let res = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(res.is_err(), "unexpected frame: {res:?}");
}

async fn send_json(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

async fn wait_for_sessions(handle: &ChatHandle, expected: usize) {
    for _ in 0..50 {
        if handle.session_count().await.unwrap() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session count never reached {expected}");
}

#[tokio::test]
async fn welcome_on_connect() {
    let (addr, handle) = start_server().await;
    let mut ws = connect(addr).await;

    let welcome = next_json(&mut ws).await;
    assert_eq!(welcome["type"], "WELCOME");
    assert_eq!(welcome["message"], "Connected to book community chat!");
    assert_eq!(welcome["messageCount"], 0);
    assert!(welcome["userId"].as_str().unwrap().starts_with("user-"));

    // Empty history: no MESSAGE_HISTORY follows.
    expect_silence(&mut ws).await;
    assert_eq!(handle.session_count().await.unwrap(), 1);
}

#[tokio::test]
async fn message_reaches_every_client() {
    let (addr, _handle) = start_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    next_json(&mut a).await;
    next_json(&mut b).await;

    send_json(
        &mut a,
        json!({"type": "SEND_MESSAGE", "data": {"userName": "Ada", "text": "Any Austen fans?"}}),
    )
    .await;

    for ws in [&mut a, &mut b] {
        let event = next_json(ws).await;
        assert_eq!(event["type"], "NEW_MESSAGE");
        assert_eq!(event["message"]["text"], "Any Austen fans?");
        assert_eq!(event["message"]["userName"], "Ada");
        assert_eq!(event["message"]["type"], "chat");
        expect_silence(ws).await;
    }
}

#[tokio::test]
async fn late_joiner_receives_history() {
    let (addr, _handle) = start_server().await;
    let mut a = connect(addr).await;
    next_json(&mut a).await;

    for n in 0..3 {
        send_json(
            &mut a,
            json!({"type": "SEND_MESSAGE", "data": {"userName": "Ada", "text": format!("m{n}")}}),
        )
        .await;
        next_json(&mut a).await;
    }

    let mut late = connect(addr).await;
    let welcome = next_json(&mut late).await;
    assert_eq!(welcome["messageCount"], 3);

    let history = next_json(&mut late).await;
    assert_eq!(history["type"], "MESSAGE_HISTORY");
    let texts: Vec<&str> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["m0", "m1", "m2"]);
}

#[tokio::test]
async fn join_notice_includes_joiner() {
    let (addr, _handle) = start_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    next_json(&mut a).await;
    next_json(&mut b).await;

    send_json(&mut b, json!({"type": "JOIN_CHAT", "data": {"userName": "PageTurner"}})).await;

    for ws in [&mut a, &mut b] {
        let event = next_json(ws).await;
        assert_eq!(event["type"], "USER_JOINED");
        assert_eq!(event["userName"], "PageTurner");
    }
}

#[tokio::test]
async fn leave_notice_goes_to_remaining_clients() {
    let (addr, handle) = start_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    next_json(&mut a).await;
    let b_welcome = next_json(&mut b).await;
    let b_id = b_welcome["userId"].as_str().unwrap().to_string();

    b.close(None).await.unwrap();

    let event = next_json(&mut a).await;
    assert_eq!(event["type"], "USER_LEFT");
    assert_eq!(event["userId"], b_id.as_str());
    wait_for_sessions(&handle, 1).await;
}

#[tokio::test]
async fn malformed_frame_gets_error_and_stays_connected() {
    let (addr, handle) = start_server().await;
    let mut a = connect(addr).await;
    next_json(&mut a).await;

    a.send(Message::Text("not-json".into())).await.unwrap();
    let event = next_json(&mut a).await;
    assert_eq!(event, json!({"type": "ERROR", "message": "Invalid message format"}));
    assert_eq!(handle.session_count().await.unwrap(), 1);

    // Still usable afterwards.
    send_json(
        &mut a,
        json!({"type": "SEND_MESSAGE", "data": {"userName": "Ada", "text": "still here"}}),
    )
    .await;
    assert_eq!(next_json(&mut a).await["type"], "NEW_MESSAGE");
}

#[tokio::test]
async fn unknown_type_is_ignored() {
    let (addr, handle) = start_server().await;
    let mut a = connect(addr).await;
    next_json(&mut a).await;

    send_json(&mut a, json!({"type": "TYPING", "data": {"userName": "Ada"}})).await;
    expect_silence(&mut a).await;
    assert_eq!(handle.session_count().await.unwrap(), 1);
    assert_eq!(handle.history_len().await.unwrap(), 0);
}

#[tokio::test]
async fn shutdown_closes_clients() {
    let (addr, handle) = start_server().await;
    let mut a = connect(addr).await;
    next_json(&mut a).await;

    handle.shutdown().await.unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), a.next())
        .await
        .expect("timed out waiting for close");
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
}
