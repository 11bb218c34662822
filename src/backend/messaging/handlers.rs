//! Messaging HTTP Handlers
//!
//! Thin adapters from the `/api/chat` routes to the delivery coordinator.
//! Authentication is done by `auth_middleware`; handlers read the caller
//! from the `AuthUser` extractor. Bodies, paths and query strings go through
//! the `Api*` extractors so malformed input is a `validation` error.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::shared::messaging::{
    JoinConversationRequest, ListConversationsResponse, ListMessagesQuery, ListMessagesResponse,
    MarkReadRequest, OpenConversationResponse, ReadReceipt, SendMessageRequest,
    SendMessageResponse,
};

use super::coordinator::DeliveryCoordinator;

/// `GET /api/chat/conversations`
pub async fn list_conversations(
    AuthUser(user): AuthUser,
    State(coordinator): State<Arc<DeliveryCoordinator>>,
) -> Result<Json<ListConversationsResponse>, BackendError> {
    let conversations = coordinator.list_conversations(user.user_id).await?;
    Ok(Json(ListConversationsResponse { conversations }))
}

/// `POST /api/chat/conversations`
///
/// Get or create the thread with `participantId` (or `otherUserId`),
/// optionally scoped to `productId`, before any message is sent.
pub async fn open_conversation(
    AuthUser(user): AuthUser,
    State(coordinator): State<Arc<DeliveryCoordinator>>,
    ApiJson(request): ApiJson<JoinConversationRequest>,
) -> Result<Json<OpenConversationResponse>, BackendError> {
    let conversation = coordinator.open_conversation(user.user_id, request).await?;
    Ok(Json(OpenConversationResponse { conversation }))
}

/// `GET /api/chat/conversations/{id}/messages?limit=&before=`
pub async fn list_messages(
    AuthUser(user): AuthUser,
    State(coordinator): State<Arc<DeliveryCoordinator>>,
    ApiPath(conversation_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListMessagesQuery>,
) -> Result<Json<ListMessagesResponse>, BackendError> {
    let page = coordinator
        .list_messages(user.user_id, conversation_id, &query)
        .await?;
    Ok(Json(page))
}

/// `POST /api/chat/messages`
pub async fn send_message(
    AuthUser(user): AuthUser,
    State(coordinator): State<Arc<DeliveryCoordinator>>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), BackendError> {
    let message = coordinator.send(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(SendMessageResponse { message })))
}

/// `POST /api/chat/conversations/{id}/read`
///
/// The body is optional; without `messageIds` every received message is
/// marked read.
pub async fn mark_read(
    AuthUser(user): AuthUser,
    State(coordinator): State<Arc<DeliveryCoordinator>>,
    ApiPath(conversation_id): ApiPath<Uuid>,
    body: Bytes,
) -> Result<Json<ReadReceipt>, BackendError> {
    let request: MarkReadRequest = if body.iter().all(u8::is_ascii_whitespace) {
        MarkReadRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| BackendError::validation("messageIds", e.to_string()))?
    };
    let receipt = coordinator
        .mark_read(user.user_id, conversation_id, &request.message_ids)
        .await?;
    Ok(Json(receipt))
}
