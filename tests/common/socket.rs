//! WebSocket helpers
//!
//! `serve` binds the router on an ephemeral port; `connect` opens a gateway
//! session and waits for `connection:ready`.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve `router` on 127.0.0.1 and return its address
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

/// Open a gateway session and wait until it is registered
pub async fn connect(addr: SocketAddr, token: &str) -> TestSocket {
    let url = format!("ws://{}/api/chat/ws?token={}", addr, token);
    let (mut socket, _) = connect_async(url).await.expect("Handshake failed");
    next_event(&mut socket, "connection:ready").await;
    socket
}

/// Send a `{event, data}` frame
pub async fn send_event(socket: &mut TestSocket, event: &str, data: Value) {
    let frame = serde_json::json!({ "event": event, "data": data });
    socket
        .send(Message::text(frame.to_string()))
        .await
        .expect("Failed to send frame");
}

/// Wait for the next event named `name`, skipping others
pub async fn next_event(socket: &mut TestSocket, name: &str) -> Value {
    let wait = async {
        while let Some(frame) = socket.next().await {
            let Ok(Message::Text(text)) = frame else {
                continue;
            };
            let event: Value = serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            if event["event"] == name {
                return event["data"].clone();
            }
        }
        panic!("Socket closed before {}", name);
    };
    tokio::time::timeout(EVENT_TIMEOUT, wait)
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for {}", name))
}
