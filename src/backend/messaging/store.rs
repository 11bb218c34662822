//! Store traits for the messaging core
//!
//! The directory, log and coordinator only talk to storage through these
//! traits. Two implementations exist: [`PgChatStore`](super::db::PgChatStore)
//! and [`MemoryStore`](super::memory::MemoryStore).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::messaging::{ChatMessage, Conversation, ConversationKey, UserRecord};

use super::db::PgChatStore;
use super::memory::MemoryStore;

/// Persistence failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A row the caller already resolved has disappeared
    #[error("missing {0}")]
    Missing(Uuid),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Conversation threads and their per-participant counters
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Every stored conversation with this key; more than one only if the
    /// write-time uniqueness was bypassed
    async fn find_by_key(&self, key: &ConversationKey) -> Result<Vec<Conversation>, StoreError>;

    /// Insert `conversation` unless one with the same key exists, and return
    /// the stored conversation for that key
    async fn insert_if_absent(&self, conversation: Conversation)
        -> Result<Conversation, StoreError>;

    /// All conversations that contain `user_id`, in no particular order
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError>;

    /// Atomically add one to the counter and return the new value
    async fn increment_unread(&self, id: Uuid, user_id: Uuid) -> Result<u32, StoreError>;

    async fn reset_unread(&self, id: Uuid, user_id: Uuid) -> Result<(), StoreError>;

    async fn touch_last_message(
        &self,
        id: Uuid,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Append-only message storage
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Up to `limit` messages, newest first, strictly older than `before`
    async fn list_page(
        &self,
        conversation_id: Uuid,
        limit: u32,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// Add `reader` to `read_by` and return the acknowledged ids.
    ///
    /// With `message_ids` empty, every message in the conversation that
    /// `reader` did not send and has not read yet is acknowledged. Ids that do
    /// not belong to the conversation are ignored.
    async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader: Uuid,
        message_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, StoreError>;
}

/// Read-only view of the external identity store
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<UserRecord>, StoreError> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.get_user(*id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }
}

/// The three stores the messaging core needs
#[derive(Clone)]
pub struct ChatStores {
    pub conversations: Arc<dyn ConversationStore>,
    pub messages: Arc<dyn MessageStore>,
    pub identity: Arc<dyn IdentityStore>,
}

impl ChatStores {
    /// All three stores backed by one in-memory store
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            conversations: store.clone(),
            messages: store.clone(),
            identity: store,
        }
    }

    /// All three stores backed by Postgres
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgChatStore::new(pool));
        Self {
            conversations: store.clone(),
            messages: store.clone(),
            identity: store,
        }
    }
}
