/**
 * Real-time Event System
 *
 * This module defines the events exchanged over the messaging gateway.
 * Every WebSocket text frame is a JSON object `{"event": <name>, "data": <payload>}`.
 *
 * # Inbound events (client → server)
 *
 * - `message:send` - Send a message (same body as `POST /api/chat/messages`)
 * - `conversation:join` - Bind this session to a conversation's broadcast group
 * - `conversation:leave` - Unbind this session from a conversation
 * - `typing` - Ephemeral typing indicator
 * - `message:read` - Acknowledge messages and reset the unread counter
 *
 * # Outbound events (server → client)
 *
 * See [`EventName`]. Outbound events carry a server timestamp.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::messaging::{JoinConversationRequest, SendMessageRequest};

/// Name of an outbound event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Sent to a session once it is registered
    #[serde(rename = "connection:ready")]
    ConnectionReady,
    /// Acknowledgement of `message:send` to the originating session
    #[serde(rename = "message:sent")]
    MessageSent,
    /// Push of a new message to the receiver's sessions
    #[serde(rename = "message:receive")]
    MessageReceive,
    /// Push of a new message to every session joined to the conversation
    #[serde(rename = "conversation:message")]
    ConversationMessage,
    #[serde(rename = "conversation:joined")]
    ConversationJoined,
    #[serde(rename = "conversation:left")]
    ConversationLeft,
    #[serde(rename = "typing")]
    Typing,
    #[serde(rename = "message:read:ack")]
    MessageReadAck,
    #[serde(rename = "user:online")]
    UserOnline,
    #[serde(rename = "user:offline")]
    UserOffline,
    #[serde(rename = "error")]
    Error,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::ConnectionReady => "connection:ready",
            EventName::MessageSent => "message:sent",
            EventName::MessageReceive => "message:receive",
            EventName::ConversationMessage => "conversation:message",
            EventName::ConversationJoined => "conversation:joined",
            EventName::ConversationLeft => "conversation:left",
            EventName::Typing => "typing",
            EventName::MessageReadAck => "message:read:ack",
            EventName::UserOnline => "user:online",
            EventName::UserOffline => "user:offline",
            EventName::Error => "error",
        }
    }
}

/// Outbound real-time event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeEvent {
    /// Event name
    pub event: EventName,
    /// Event payload (JSON-serializable data)
    pub data: serde_json::Value,
    /// When the server produced the event
    pub timestamp: DateTime<Utc>,
}

impl RealtimeEvent {
    /// Create a new real-time event
    pub fn new(event: EventName, data: serde_json::Value) -> Self {
        Self {
            event,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Create an event from any serializable payload
    pub fn from_payload<T: Serialize>(
        event: EventName,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event, serde_json::to_value(payload)?))
    }

    /// Create a typing event
    pub fn typing(conversation_id: Uuid, user_id: Uuid, is_typing: bool) -> Self {
        Self::new(
            EventName::Typing,
            serde_json::json!({
                "conversationId": conversation_id,
                "userId": user_id,
                "isTyping": is_typing,
            }),
        )
    }

    /// Create a presence event
    pub fn presence(user_id: Uuid, online: bool) -> Self {
        let event = if online {
            EventName::UserOnline
        } else {
            EventName::UserOffline
        };
        Self::new(event, serde_json::json!({ "userId": user_id }))
    }

    /// Create an error event for the originating session
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Self::new(
            EventName::Error,
            serde_json::json!({
                "kind": kind,
                "message": message.into(),
            }),
        )
    }
}

/// `typing` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub conversation_id: Uuid,
    #[serde(default)]
    pub is_typing: bool,
}

/// `message:read` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadPayload {
    pub conversation_id: Uuid,
    #[serde(default)]
    pub message_ids: Vec<Uuid>,
}

/// `conversation:leave` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeavePayload {
    pub conversation_id: Uuid,
}

/// Inbound event from a client session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "message:send")]
    SendMessage(SendMessageRequest),
    #[serde(rename = "conversation:join")]
    JoinConversation(JoinConversationRequest),
    #[serde(rename = "conversation:leave")]
    LeaveConversation(LeavePayload),
    #[serde(rename = "typing")]
    Typing(TypingPayload),
    #[serde(rename = "message:read")]
    MarkRead(ReadPayload),
}
