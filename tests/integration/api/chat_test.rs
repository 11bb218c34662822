//! Chat API integration tests
//!
//! Conversation creation, product scoping, unread counters and history
//! paging through the HTTP API.

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use crate::common::TestApp;

#[tokio::test]
async fn test_first_message_creates_conversation() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let message = app.send_text(&alice, &bob, "hi").await;
    assert_eq!(message["text"], "hi");
    assert_eq!(message["sender"]["id"], alice.id.to_string());
    assert_eq!(message["sender"]["name"], "Alice");

    let threads = app.threads(&bob).await;
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["id"], message["conversationId"]);
    assert_eq!(threads[0]["unreadCount"], 1);
    assert_eq!(threads[0]["lastMessage"], "hi");
    assert_eq!(threads[0]["otherParticipant"]["id"], alice.id.to_string());
    assert_eq!(threads[0]["productId"], serde_json::Value::Null);

    let mut participants: Vec<String> = threads[0]["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap().to_string())
        .collect();
    participants.sort();
    let mut expected = vec![alice.id.to_string(), bob.id.to_string()];
    expected.sort();
    assert_eq!(participants, expected);

    let sender_threads = app.threads(&alice).await;
    assert_eq!(sender_threads.len(), 1);
    assert_eq!(sender_threads[0]["unreadCount"], 0);
}

#[tokio::test]
async fn test_replies_reuse_the_conversation() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let first = app.send_text(&alice, &bob, "is the desk available?").await;
    let reply = app.send_text(&bob, &alice, "yes").await;
    assert_eq!(first["conversationId"], reply["conversationId"]);

    let (status, body) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "conversationId": first["conversationId"], "text": "great" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["conversationId"], first["conversationId"]);

    assert_eq!(app.threads(&alice).await.len(), 1);
    assert_eq!(app.threads(&bob).await.len(), 1);
}

#[tokio::test]
async fn test_open_conversation_over_http() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let lamp = Uuid::new_v4();

    let (status, opened) = app
        .post(
            "/api/chat/conversations",
            &alice,
            json!({ "participantId": bob.id, "productId": lamp }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "open failed: {}", opened);
    let conversation = &opened["conversation"];
    assert_eq!(conversation["otherParticipant"]["id"], bob.id.to_string());
    assert_eq!(conversation["productId"], lamp.to_string());
    assert_eq!(conversation["unreadCount"], 0);

    // Opening again from the other side finds the same thread
    let (status, reopened) = app
        .post(
            "/api/chat/conversations",
            &bob,
            json!({ "otherUserId": alice.id, "productId": lamp }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["conversation"]["id"], conversation["id"]);

    let (_, sent) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "receiverId": bob.id, "productId": lamp, "text": "still for sale?" }),
        )
        .await;
    assert_eq!(sent["message"]["conversationId"], conversation["id"]);
    assert_eq!(app.store.conversation_count().await, 1);

    let (status, body) = app
        .post("/api/chat/conversations", &alice, json!({ "productId": lamp }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    crate::assert_error_body!(body, 400, "validation");
}

#[tokio::test]
async fn test_product_scope_separates_threads() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let lamp = Uuid::new_v4();
    let bike = Uuid::new_v4();

    let (_, first) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "receiverId": bob.id, "productId": lamp, "text": "lamp?" }),
        )
        .await;
    let (_, second) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "receiverId": bob.id, "productId": bike, "text": "bike?" }),
        )
        .await;
    let general = app.send_text(&alice, &bob, "hello").await;

    let ids = [
        first["message"]["conversationId"].clone(),
        second["message"]["conversationId"].clone(),
        general["conversationId"].clone(),
    ];
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[0], ids[2]);
    assert_ne!(ids[1], ids[2]);

    let threads = app.threads(&bob).await;
    assert_eq!(threads.len(), 3);
    // Most recent first
    assert_eq!(threads[0]["lastMessage"], "hello");
    assert_eq!(threads[1]["productId"], bike.to_string());
    assert_eq!(threads[2]["productId"], lamp.to_string());
}

#[tokio::test]
async fn test_unread_counter_resets_on_read() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let mut conversation_id = serde_json::Value::Null;
    for text in ["one", "two", "three"] {
        conversation_id = app.send_text(&alice, &bob, text).await["conversationId"].clone();
    }
    assert_eq!(app.threads(&bob).await[0]["unreadCount"], 3);

    let uri = format!(
        "/api/chat/conversations/{}/read",
        conversation_id.as_str().unwrap()
    );
    let (status, receipt) = app
        .request(Method::POST, &uri, Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["unreadCount"], 0);
    assert_eq!(receipt["conversationId"], conversation_id);
    assert_eq!(receipt["messageIds"].as_array().unwrap().len(), 3);
    assert_eq!(app.threads(&bob).await[0]["unreadCount"], 0);

    app.send_text(&alice, &bob, "four").await;
    assert_eq!(app.threads(&bob).await[0]["unreadCount"], 1);
}

#[tokio::test]
async fn test_mark_read_with_explicit_ids() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let first = app.send_text(&alice, &bob, "first").await;
    app.send_text(&alice, &bob, "second").await;

    let uri = format!(
        "/api/chat/conversations/{}/read",
        first["conversationId"].as_str().unwrap()
    );
    let (status, receipt) = app
        .post(&uri, &bob, json!({ "messageIds": [first["id"]] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["messageIds"], json!([first["id"]]));

    let history_uri = format!(
        "/api/chat/conversations/{}/messages",
        first["conversationId"].as_str().unwrap()
    );
    let (_, history) = app.get(&history_uri, &bob).await;
    assert_eq!(history["messages"][0]["readBy"], json!([bob.id]));
    assert_eq!(history["messages"][1]["readBy"], json!([]));
}

#[tokio::test]
async fn test_offline_receiver_finds_message_in_history() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let sent = app.send_text(&alice, &bob, "are you there?").await;
    assert_eq!(app.state.sessions.session_count().await, 0);

    let uri = format!(
        "/api/chat/conversations/{}/messages",
        sent["conversationId"].as_str().unwrap()
    );
    let (status, body) = app.get(&uri, &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasMore"], false);
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["id"], sent["id"]);
}

#[tokio::test]
async fn test_history_pages_oldest_first_within_page() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let mut sent = Vec::new();
    for i in 0..5 {
        let (from, to) = if i % 2 == 0 { (&alice, &bob) } else { (&bob, &alice) };
        sent.push(app.send_text(from, to, &format!("message {}", i)).await);
    }
    let conversation = sent[0]["conversationId"].as_str().unwrap().to_string();

    let uri = format!("/api/chat/conversations/{}/messages?limit=2", conversation);
    let (status, page) = app.get(&uri, &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["hasMore"], true);
    let texts: Vec<&str> = page["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["message 3", "message 4"]);

    let oldest = page["messages"][0]["createdAt"].as_str().unwrap();
    let uri = format!(
        "/api/chat/conversations/{}/messages?limit=2&before={}",
        conversation, oldest
    );
    let (_, older) = app.get(&uri, &alice).await;
    let texts: Vec<&str> = older["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["message 1", "message 2"]);
    assert_eq!(older["hasMore"], true);

    let uri = format!("/api/chat/conversations/{}/messages", conversation);
    let (_, all) = app.get(&uri, &alice).await;
    let stamps: Vec<&str> = all["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["createdAt"].as_str().unwrap())
        .collect();
    assert_eq!(stamps.len(), 5);
    let parsed: Vec<chrono::DateTime<chrono::Utc>> =
        stamps.iter().map(|s| s.parse().unwrap()).collect();
    assert!(parsed.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_attachment_only_message() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let (status, body) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "receiverId": bob.id, "text": "", "attachments": ["https://cdn.example/desk.jpg"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["attachments"][0], "https://cdn.example/desk.jpg");

    let threads = app.threads(&bob).await;
    assert_eq!(threads[0]["lastMessage"], "Attachment");
}

#[tokio::test]
async fn test_health_reports_sessions() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "sessions": 0 }));
}
