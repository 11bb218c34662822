//! Chat Message Data Structure
//!
//! Represents a message in a conversation, plus the request and response
//! bodies that carry messages over HTTP and the WebSocket gateway.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

use super::user::UserSummary;

/// A persisted chat message
///
/// `created_at` is assigned once when the message is appended and is the only
/// ordering key within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_by: BTreeSet<Uuid>,
}

impl ChatMessage {
    pub fn new(
        conversation_id: Uuid,
        sender_id: Uuid,
        text: String,
        attachments: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            text,
            attachments,
            created_at,
            read_by: BTreeSet::new(),
        }
    }

    /// Get a preview of the message (first N characters)
    pub fn preview(&self, max_len: usize) -> String {
        if self.text.chars().count() <= max_len {
            self.text.clone()
        } else {
            let mut preview: String = self.text.chars().take(max_len.saturating_sub(3)).collect();
            preview.push_str("...");
            preview
        }
    }
}

/// A message with its sender's display fields embedded, as pushed to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: UserSummary,
    pub text: String,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub read_by: Vec<Uuid>,
}

impl MessageView {
    pub fn new(message: ChatMessage, sender: UserSummary) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender,
            text: message.text,
            attachments: message.attachments,
            created_at: message.created_at,
            read_by: message.read_by.into_iter().collect(),
        }
    }
}

/// Request to send a message, shared by `POST /api/chat/messages` and `message:send`
///
/// Either `receiver_id` or `conversation_id` must be present. `product_id` only
/// matters when the conversation is resolved from the receiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub receiver_id: Option<Uuid>,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl SendMessageRequest {
    /// Text-only message to `receiver_id`
    pub fn to_user(receiver_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            receiver_id: Some(receiver_id),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Field checks that need no store access
    pub fn validate(&self, sender_id: Uuid) -> Result<(), SharedError> {
        if self.receiver_id.is_none() && self.conversation_id.is_none() {
            return Err(SharedError::validation(
                "receiverId",
                "a receiver or conversation is required",
            ));
        }
        if self.receiver_id == Some(sender_id) {
            return Err(SharedError::validation(
                "receiverId",
                "cannot send a message to yourself",
            ));
        }
        if self.text.trim().is_empty() && self.attachments.is_empty() {
            return Err(SharedError::validation(
                "text",
                "message text or an attachment is required",
            ));
        }
        Ok(())
    }
}

/// Response after sending a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message: MessageView,
}

/// Query parameters for listing messages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<u32>,
    /// Only messages strictly older than this instant
    pub before: Option<DateTime<Utc>>,
}

/// Response for listing messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageView>,
    pub has_more: bool,
}
