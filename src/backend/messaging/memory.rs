//! In-memory store
//!
//! Used by the test suite and when the server starts without `DATABASE_URL`.
//! A single `RwLock` covers users, conversations and messages; the
//! insert-if-absent check runs under the write lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::shared::messaging::{ChatMessage, Conversation, ConversationKey, UserRecord};

use super::store::{ConversationStore, IdentityStore, MessageStore, StoreError};

#[derive(Default)]
struct MemoryInner {
    users: HashMap<Uuid, UserRecord>,
    conversations: HashMap<Uuid, Conversation>,
    /// Per conversation, in append order
    messages: HashMap<Uuid, Vec<ChatMessage>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the identity store
    pub async fn insert_user(&self, user: UserRecord) {
        self.inner.write().await.users.insert(user.id, user);
    }

    /// Store a conversation without the uniqueness check
    ///
    /// Reproduces rows left behind by older writers that did not enforce the
    /// unique key; lookups and listings must still behave.
    pub async fn insert_conversation_unchecked(&self, conversation: Conversation) {
        self.inner
            .write()
            .await
            .conversations
            .insert(conversation.id, conversation);
    }

    pub async fn conversation_count(&self) -> usize {
        self.inner.read().await.conversations.len()
    }

    pub async fn message_count(&self, conversation_id: Uuid) -> usize {
        self.inner
            .read()
            .await
            .messages
            .get(&conversation_id)
            .map_or(0, Vec::len)
    }
}

fn matching<'a>(
    conversations: &'a HashMap<Uuid, Conversation>,
    key: &'a ConversationKey,
) -> impl Iterator<Item = &'a Conversation> + 'a {
    conversations.values().filter(move |c| c.key() == *key)
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        Ok(self.inner.read().await.conversations.get(&id).cloned())
    }

    async fn find_by_key(&self, key: &ConversationKey) -> Result<Vec<Conversation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(matching(&inner.conversations, key).cloned().collect())
    }

    async fn insert_if_absent(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, StoreError> {
        let mut inner = self.inner.write().await;
        let key = conversation.key();
        if let Some(existing) = matching(&inner.conversations, &key).min_by(|a, b| a.recency_cmp(b)) {
            return Ok(existing.clone());
        }
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .conversations
            .values()
            .filter(|c| c.has_participant(user_id))
            .cloned()
            .collect())
    }

    async fn increment_unread(&self, id: Uuid, user_id: Uuid) -> Result<u32, StoreError> {
        let mut inner = self.inner.write().await;
        let conversation = inner
            .conversations
            .get_mut(&id)
            .ok_or(StoreError::Missing(id))?;
        let count = conversation.unread_counts.entry(user_id).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn reset_unread(&self, id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let conversation = inner
            .conversations
            .get_mut(&id)
            .ok_or(StoreError::Missing(id))?;
        if let Some(count) = conversation.unread_counts.get_mut(&user_id) {
            *count = 0;
        }
        Ok(())
    }

    async fn touch_last_message(
        &self,
        id: Uuid,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let conversation = inner
            .conversations
            .get_mut(&id)
            .ok_or(StoreError::Missing(id))?;
        conversation.last_message = Some(text.to_string());
        conversation.last_message_at = at;
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: &ChatMessage) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn list_page(
        &self,
        conversation_id: Uuid,
        limit: u32,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.read().await;
        let Some(messages) = inner.messages.get(&conversation_id) else {
            return Ok(Vec::new());
        };
        let mut page: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| before.map_or(true, |cutoff| m.created_at < cutoff))
            .cloned()
            .collect();
        page.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader: Uuid,
        message_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(messages) = inner.messages.get_mut(&conversation_id) else {
            return Ok(Vec::new());
        };
        let mut acknowledged = Vec::new();
        for message in messages.iter_mut() {
            let selected = if message_ids.is_empty() {
                message.sender_id != reader && !message.read_by.contains(&reader)
            } else {
                message_ids.contains(&message.id)
            };
            if selected {
                message.read_by.insert(reader);
                acknowledged.push(message.id);
            }
        }
        Ok(acknowledged)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }
}
