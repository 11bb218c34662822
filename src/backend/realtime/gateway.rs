//! Messaging Gateway
//!
//! WebSocket endpoint at `GET /api/chat/ws`. The handshake is authenticated
//! before the upgrade; an unauthenticated request gets a 401 and never
//! becomes a session.
//!
//! Each connection runs on its own task: a writer task drains the session's
//! channel into the socket while the reader loop handles inbound frames one
//! at a time, so a sender's events are processed in the order they were sent.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::{authenticate, bearer_token};
use crate::backend::server::state::AppState;
use crate::shared::event::{ClientEvent, LeavePayload, ReadPayload, TypingPayload};
use crate::shared::messaging::{JoinConversationRequest, SendMessageRequest, SendMessageResponse};
use crate::shared::{EventName, RealtimeEvent};

use super::broadcast::{EventRouter, SessionId};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Upgrade handler
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, BackendError> {
    let token = bearer_token(&headers)
        .map(str::to_string)
        .or(params.token)
        .ok_or_else(|| {
            tracing::warn!("[Gateway] Handshake rejected: no token");
            BackendError::unauthenticated("missing token")
        })?;
    let user = authenticate(&state, &token).await.inspect_err(|e| {
        tracing::warn!("[Gateway] Handshake rejected: {}", e);
    })?;

    let user_id = user.user_id;
    Ok(ws.on_upgrade(move |socket| run_session(socket, state, user_id)))
}

async fn run_session(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (mut sink, mut stream) = socket.split();
    let registration = state.sessions.register(user_id).await;
    let session_id = registration.session_id;
    let mut outbound = registration.receiver;

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("[Gateway] Failed to encode {}: {}", event.event.as_str(), e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    tracing::info!("[Gateway] User {} connected (session {})", user_id, session_id);
    let ready = RealtimeEvent::new(
        EventName::ConnectionReady,
        serde_json::json!({ "userId": user_id, "sessionId": session_id }),
    );
    let _ = state.sessions.emit_to_session(session_id, &ready).await;
    if registration.first_session && state.config.presence_enabled {
        state
            .sessions
            .emit_to_others(user_id, &RealtimeEvent::presence(user_id, true))
            .await;
    }

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                handle_frame(&state, user_id, session_id, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("[Gateway] Socket error on session {}: {}", session_id, e);
                break;
            }
        }
    }

    if let Some(departure) = state.sessions.unregister(user_id, session_id).await {
        if departure.last_session && state.config.presence_enabled {
            state
                .sessions
                .emit_to_others(user_id, &RealtimeEvent::presence(user_id, false))
                .await;
        }
    }
    writer.abort();
    tracing::info!("[Gateway] User {} disconnected (session {})", user_id, session_id);
}

/// Handle one inbound text frame; failures go back to this session only
pub async fn handle_frame(state: &AppState, user_id: Uuid, session_id: SessionId, text: &str) {
    let result = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => dispatch(state, user_id, session_id, event).await,
        Err(e) => Err(BackendError::validation("event", format!("malformed frame: {}", e))),
    };
    if let Err(err) = result {
        tracing::debug!("[Gateway] Session {} error: {}", session_id, err);
        let _ = state.sessions.emit_to_session(session_id, &err.to_event()).await;
    }
}

async fn dispatch(
    state: &AppState,
    user_id: Uuid,
    session_id: SessionId,
    event: ClientEvent,
) -> Result<(), BackendError> {
    match event {
        ClientEvent::SendMessage(request) => send(state, user_id, session_id, request).await,
        ClientEvent::JoinConversation(request) => join(state, user_id, session_id, request).await,
        ClientEvent::LeaveConversation(payload) => leave(state, session_id, payload).await,
        ClientEvent::Typing(payload) => typing(state, user_id, session_id, payload).await,
        ClientEvent::MarkRead(payload) => read(state, user_id, session_id, payload).await,
    }
}

async fn send(
    state: &AppState,
    user_id: Uuid,
    session_id: SessionId,
    request: SendMessageRequest,
) -> Result<(), BackendError> {
    let message = state.coordinator.send(user_id, request).await?;
    let ack = RealtimeEvent::from_payload(EventName::MessageSent, &SendMessageResponse { message })?;
    state.sessions.emit_to_session(session_id, &ack).await
}

async fn join(
    state: &AppState,
    user_id: Uuid,
    session_id: SessionId,
    request: JoinConversationRequest,
) -> Result<(), BackendError> {
    let conversation = state.coordinator.open_conversation(user_id, request).await?;
    state.sessions.join(session_id, conversation.id).await;
    let joined = RealtimeEvent::from_payload(EventName::ConversationJoined, &conversation)?;
    state.sessions.emit_to_session(session_id, &joined).await
}

async fn leave(
    state: &AppState,
    session_id: SessionId,
    payload: LeavePayload,
) -> Result<(), BackendError> {
    state.sessions.leave(session_id, payload.conversation_id).await;
    let left = RealtimeEvent::from_payload(EventName::ConversationLeft, &payload)?;
    state.sessions.emit_to_session(session_id, &left).await
}

async fn typing(
    state: &AppState,
    user_id: Uuid,
    session_id: SessionId,
    payload: TypingPayload,
) -> Result<(), BackendError> {
    if !state.sessions.is_joined(session_id, payload.conversation_id).await {
        return Err(BackendError::forbidden(
            "join the conversation before sending typing events",
        ));
    }
    let event = RealtimeEvent::typing(payload.conversation_id, user_id, payload.is_typing);
    state
        .sessions
        .emit_to_conversation(payload.conversation_id, &event, Some(session_id))
        .await;
    Ok(())
}

async fn read(
    state: &AppState,
    user_id: Uuid,
    session_id: SessionId,
    payload: ReadPayload,
) -> Result<(), BackendError> {
    let receipt = state
        .coordinator
        .mark_read(user_id, payload.conversation_id, &payload.message_ids)
        .await?;
    // Joined sessions already got the ack from the room broadcast
    if !state.sessions.is_joined(session_id, payload.conversation_id).await {
        let ack = RealtimeEvent::from_payload(EventName::MessageReadAck, &receipt)?;
        state.sessions.emit_to_session(session_id, &ack).await?;
    }
    Ok(())
}
