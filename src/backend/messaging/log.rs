//! Message Log
//!
//! Append-only, per-conversation record of messages. Every operation checks
//! that the caller is a participant before touching the store.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::config::ChatConfig;
use crate::shared::messaging::{ChatMessage, ListMessagesQuery};

use super::clock::MonotonicClock;
use super::directory::ConversationDirectory;
use super::store::MessageStore;

/// One page of history in ascending `created_at` order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePage {
    pub messages: Vec<ChatMessage>,
    /// Older messages exist before the first one in `messages`
    pub has_more: bool,
}

pub struct MessageLog {
    store: Arc<dyn MessageStore>,
    directory: Arc<ConversationDirectory>,
    clock: Arc<MonotonicClock>,
    config: ChatConfig,
}

impl MessageLog {
    pub fn new(
        store: Arc<dyn MessageStore>,
        directory: Arc<ConversationDirectory>,
        clock: Arc<MonotonicClock>,
        config: ChatConfig,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            config,
        }
    }

    pub async fn append(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: String,
        attachments: Vec<String>,
    ) -> Result<ChatMessage, BackendError> {
        self.directory.authorize(conversation_id, sender_id).await?;
        let message = ChatMessage::new(
            conversation_id,
            sender_id,
            text,
            attachments,
            self.clock.now(),
        );
        self.store.insert(&message).await?;
        Ok(message)
    }

    pub async fn list(
        &self,
        conversation_id: Uuid,
        caller: Uuid,
        query: &ListMessagesQuery,
    ) -> Result<MessagePage, BackendError> {
        self.directory.authorize(conversation_id, caller).await?;
        let limit = self.config.page_size(query.limit);

        // One extra row tells us whether an older page exists
        let mut messages = self
            .store
            .list_page(conversation_id, limit.saturating_add(1), query.before)
            .await?;
        let has_more = messages.len() > limit as usize;
        messages.truncate(limit as usize);
        messages.reverse();

        Ok(MessagePage { messages, has_more })
    }

    pub async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader: Uuid,
        message_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, BackendError> {
        self.directory.authorize(conversation_id, reader).await?;
        Ok(self
            .store
            .mark_read(conversation_id, reader, message_ids)
            .await?)
    }
}
