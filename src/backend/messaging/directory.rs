//! Conversation Directory
//!
//! Owns conversation identity: one thread per participant pair and product
//! scope. Uniqueness is enforced when writing (`insert_if_absent`) and again
//! when reading (`dedup_threads`), so rows left by a lost race or an older
//! writer never show up twice.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::messaging::{Conversation, ConversationKey, ProductScope};

use super::clock::MonotonicClock;
use super::store::ConversationStore;

pub struct ConversationDirectory {
    store: Arc<dyn ConversationStore>,
    clock: Arc<MonotonicClock>,
}

impl ConversationDirectory {
    pub fn new(store: Arc<dyn ConversationStore>, clock: Arc<MonotonicClock>) -> Self {
        Self { store, clock }
    }

    /// The thread for {a, b} in `scope`, created if absent
    pub async fn find_or_create(
        &self,
        a: Uuid,
        b: Uuid,
        scope: ProductScope,
    ) -> Result<Conversation, BackendError> {
        let key = ConversationKey::new(a, b, scope)?;
        if let Some(existing) = pick_thread(self.store.find_by_key(&key).await?) {
            return Ok(existing);
        }

        let conversation = self
            .store
            .insert_if_absent(Conversation::new(key, self.clock.now()))
            .await?;
        tracing::debug!(
            "[Directory] Resolved conversation {} for scope {}",
            conversation.id,
            scope
        );
        Ok(conversation)
    }

    /// Threads of `user_id`, most recent first, one per (other participant, scope)
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, BackendError> {
        let conversations = self.store.list_for_user(user_id).await?;
        Ok(dedup_threads(conversations, user_id))
    }

    pub async fn get(&self, id: Uuid) -> Result<Conversation, BackendError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| BackendError::not_found("conversation", id))
    }

    /// The conversation, if `user_id` is one of its participants
    pub async fn authorize(&self, id: Uuid, user_id: Uuid) -> Result<Conversation, BackendError> {
        let conversation = self.get(id).await?;
        if !conversation.has_participant(user_id) {
            tracing::warn!(
                "[Directory] User {} is not a participant of {}",
                user_id,
                id
            );
            return Err(BackendError::forbidden(
                "not a participant in this conversation",
            ));
        }
        Ok(conversation)
    }

    pub async fn increment_unread(&self, id: Uuid, for_user: Uuid) -> Result<u32, BackendError> {
        self.authorize(id, for_user).await?;
        Ok(self.store.increment_unread(id, for_user).await?)
    }

    pub async fn reset_unread(&self, id: Uuid, for_user: Uuid) -> Result<(), BackendError> {
        self.authorize(id, for_user).await?;
        Ok(self.store.reset_unread(id, for_user).await?)
    }

    pub async fn touch_last_message(
        &self,
        id: Uuid,
        actor: Uuid,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), BackendError> {
        self.authorize(id, actor).await?;
        Ok(self.store.touch_last_message(id, text, at).await?)
    }

    /// The participant of `conversation` that is not `self_id`
    pub fn other_participant(
        conversation: &Conversation,
        self_id: Uuid,
    ) -> Result<Uuid, BackendError> {
        conversation
            .other_participant(self_id)
            .ok_or_else(|| BackendError::forbidden("not a participant in this conversation"))
    }
}

/// The thread clients see among rows sharing one key
fn pick_thread(candidates: Vec<Conversation>) -> Option<Conversation> {
    candidates.into_iter().min_by(|a, b| a.recency_cmp(b))
}

/// Collapse duplicate threads as seen by `self_id`.
///
/// Groups by (other participant, product scope), keeps the most recent of
/// each group (latest `last_message_at`, then highest id) and returns the
/// survivors most recent first. Conversations without `self_id` are dropped.
pub fn dedup_threads(conversations: Vec<Conversation>, self_id: Uuid) -> Vec<Conversation> {
    let mut latest: HashMap<(Uuid, ProductScope), Conversation> = HashMap::new();
    for conversation in conversations {
        let Some(other) = conversation.other_participant(self_id) else {
            continue;
        };
        let group = (other, conversation.scope());
        match latest.get(&group) {
            Some(kept) if kept.recency_cmp(&conversation).is_le() => {}
            _ => {
                latest.insert(group, conversation);
            }
        }
    }
    let mut threads: Vec<Conversation> = latest.into_values().collect();
    threads.sort_by(|a, b| a.recency_cmp(b));
    threads
}
