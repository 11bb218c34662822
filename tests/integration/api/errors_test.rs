//! Error responses of the chat API
//!
//! Every failure is a JSON body `{ error, kind, status }`.

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use crate::common::TestApp;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app
        .request(Method::GET, "/api/chat/conversations", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    crate::assert_error_body!(body, 401, "authorization");
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::GET,
            "/api/chat/conversations",
            Some("not-a-jwt"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    crate::assert_error_body!(body, 401, "authorization");
}

#[tokio::test]
async fn test_token_for_unknown_user_is_unauthorized() {
    let app = TestApp::new();
    let token = app.state.keys.create_token(Uuid::new_v4()).unwrap();
    let (status, _) = app
        .request(Method::GET, "/api/chat/conversations", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_participant_is_forbidden() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let carol = app.user("Carol").await;

    let sent = app.send_text(&alice, &bob, "private").await;
    let conversation = sent["conversationId"].as_str().unwrap().to_string();

    let (status, body) = app
        .get(
            &format!("/api/chat/conversations/{}/messages", conversation),
            &carol,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    crate::assert_error_body!(body, 403, "authorization");

    let (status, _) = app
        .post(
            "/api/chat/messages",
            &carol,
            json!({ "conversationId": conversation, "text": "let me in" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            &format!("/api/chat/conversations/{}/read", conversation),
            &carol,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nothing leaked into the thread
    assert_eq!(app.threads(&bob).await[0]["unreadCount"], 1);
}

#[tokio::test]
async fn test_unknown_conversation_is_not_found() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let (status, body) = app
        .get(
            &format!("/api/chat/conversations/{}/messages", Uuid::new_v4()),
            &alice,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    crate::assert_error_body!(body, 404, "not_found");
}

#[tokio::test]
async fn test_unknown_receiver_is_not_found() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let (status, body) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "receiverId": Uuid::new_v4(), "text": "hello?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    crate::assert_contains!(body["error"].as_str().unwrap(), "user");
    assert_eq!(app.store.conversation_count().await, 0);
}

#[tokio::test]
async fn test_blank_message_is_rejected() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let (status, body) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "receiverId": bob.id, "text": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    crate::assert_error_body!(body, 400, "validation");
    assert_eq!(body["field"], "text");
    assert_eq!(app.store.conversation_count().await, 0);
}

#[tokio::test]
async fn test_message_to_self_is_rejected() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let (status, body) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "receiverId": alice.id, "text": "note to self" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "receiverId");
}

#[tokio::test]
async fn test_malformed_receiver_id_is_validation_error() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let (status, body) = app
        .post(
            "/api/chat/messages",
            &alice,
            json!({ "receiverId": "not-a-uuid", "text": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    crate::assert_error_body!(body, 400, "validation");
    assert_eq!(body["field"], "body");
    assert_eq!(app.store.conversation_count().await, 0);
}

#[tokio::test]
async fn test_malformed_conversation_id_is_validation_error() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;

    let (status, body) = app
        .get("/api/chat/conversations/not-a-uuid/messages", &alice)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    crate::assert_error_body!(body, 400, "validation");

    let (status, body) = app
        .post("/api/chat/conversations/not-a-uuid/read", &alice, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    crate::assert_error_body!(body, 400, "validation");
}

#[tokio::test]
async fn test_malformed_page_query_is_validation_error() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let sent = app.send_text(&alice, &bob, "hi").await;
    let conversation = sent["conversationId"].as_str().unwrap().to_string();

    for query in ["limit=abc", "before=yesterday"] {
        let (status, body) = app
            .get(
                &format!("/api/chat/conversations/{}/messages?{}", conversation, query),
                &alice,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {}", query);
        crate::assert_error_body!(body, 400, "validation");
        assert_eq!(body["field"], "query");
    }
}
