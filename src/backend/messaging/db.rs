//! Database operations for messaging
//!
//! Postgres implementation of the conversation, message and identity stores.
//! Schema lives in `migrations/`.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::shared::messaging::{
    ChatMessage, Conversation, ConversationKey, ParticipantPair, UserRecord, UserRole,
};

use super::store::{ConversationStore, IdentityStore, MessageStore, StoreError};

#[derive(Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach unread counters to freshly loaded conversation rows
    async fn with_unread(&self, rows: Vec<PgRow>) -> Result<Vec<Conversation>, StoreError> {
        let mut conversations = rows
            .iter()
            .map(conversation_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        if conversations.is_empty() {
            return Ok(conversations);
        }

        let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();
        let counts = sqlx::query(
            r#"
            SELECT conversation_id, user_id, count
            FROM conversation_unread
            WHERE conversation_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_conversation: HashMap<Uuid, HashMap<Uuid, u32>> = HashMap::new();
        for row in counts {
            let count: i32 = row.get("count");
            by_conversation
                .entry(row.get("conversation_id"))
                .or_default()
                .insert(row.get("user_id"), count.max(0) as u32);
        }
        for conversation in &mut conversations {
            if let Some(counts) = by_conversation.remove(&conversation.id) {
                conversation.unread_counts = counts;
            }
        }
        Ok(conversations)
    }

    /// Attach `read_by` sets to freshly loaded message rows
    async fn with_reads(&self, mut messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>, StoreError> {
        if messages.is_empty() {
            return Ok(messages);
        }
        let ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
        let rows = sqlx::query(
            r#"
            SELECT message_id, user_id
            FROM message_reads
            WHERE message_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut readers: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for row in rows {
            readers
                .entry(row.get("message_id"))
                .or_default()
                .insert(row.get("user_id"));
        }
        for message in &mut messages {
            if let Some(read_by) = readers.remove(&message.id) {
                message.read_by = read_by;
            }
        }
        Ok(messages)
    }
}

const CONVERSATION_COLUMNS: &str = "id, participant_low, participant_high, product_id, last_message, last_message_at, created_at";

fn conversation_from_row(row: &PgRow) -> Result<Conversation, StoreError> {
    let low: Uuid = row.get("participant_low");
    let high: Uuid = row.get("participant_high");
    let participants = ParticipantPair::new(low, high)
        .map_err(|e| StoreError::unavailable(format!("corrupt conversation row: {}", e)))?;
    Ok(Conversation {
        id: row.get("id"),
        participants,
        product_id: row.get("product_id"),
        unread_counts: HashMap::new(),
        last_message: row.get("last_message"),
        last_message_at: row.get("last_message_at"),
        created_at: row.get("created_at"),
    })
}

fn message_from_row(row: &PgRow) -> ChatMessage {
    ChatMessage {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id: row.get("sender_id"),
        text: row.get("text"),
        attachments: row.get("attachments"),
        created_at: row.get("created_at"),
        read_by: BTreeSet::new(),
    }
}

#[async_trait]
impl ConversationStore for PgChatStore {
    async fn get(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        let query = format!("SELECT {} FROM conversations WHERE id = $1", CONVERSATION_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(self.with_unread(row.into_iter().collect()).await?.pop())
    }

    async fn find_by_key(&self, key: &ConversationKey) -> Result<Vec<Conversation>, StoreError> {
        let query = format!(
            "SELECT {} FROM conversations WHERE participant_low = $1 AND participant_high = $2 AND scope_key = $3",
            CONVERSATION_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(key.participants.low())
            .bind(key.participants.high())
            .bind(key.scope.key())
            .fetch_all(&self.pool)
            .await?;
        self.with_unread(rows).await
    }

    async fn insert_if_absent(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, StoreError> {
        let key = conversation.key();
        sqlx::query(
            r#"
            INSERT INTO conversations
                (id, participant_low, participant_high, product_id, scope_key, last_message, last_message_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (participant_low, participant_high, scope_key) DO NOTHING
            "#,
        )
        .bind(conversation.id)
        .bind(key.participants.low())
        .bind(key.participants.high())
        .bind(conversation.product_id)
        .bind(key.scope.key())
        .bind(&conversation.last_message)
        .bind(conversation.last_message_at)
        .bind(conversation.created_at)
        .execute(&self.pool)
        .await?;

        // Either our row or the one that won the race
        self.find_by_key(&key)
            .await?
            .into_iter()
            .min_by(|a, b| a.recency_cmp(b))
            .ok_or(StoreError::Missing(conversation.id))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let query = format!(
            "SELECT {} FROM conversations WHERE participant_low = $1 OR participant_high = $1",
            CONVERSATION_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        self.with_unread(rows).await
    }

    async fn increment_unread(&self, id: Uuid, user_id: Uuid) -> Result<u32, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO conversation_unread (conversation_id, user_id, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (conversation_id, user_id)
            DO UPDATE SET count = conversation_unread.count + 1
            RETURNING count
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        let count: i32 = row.get("count");
        Ok(count.max(0) as u32)
    }

    async fn reset_unread(&self, id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE conversation_unread SET count = 0
            WHERE conversation_id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch_last_message(
        &self,
        id: Uuid,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET last_message = $2, last_message_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(id));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for PgChatStore {
    async fn insert(&self, message: &ChatMessage) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, text, attachments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.text)
        .bind(&message.attachments)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_page(
        &self,
        conversation_id: Uuid,
        limit: u32,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, text, attachments, created_at
            FROM messages
            WHERE conversation_id = $1
              AND ($2::timestamptz IS NULL OR created_at < $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(conversation_id)
        .bind(before)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        self.with_reads(rows.iter().map(message_from_row).collect()).await
    }

    async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader: Uuid,
        message_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, StoreError> {
        let rows = if message_ids.is_empty() {
            sqlx::query(
                r#"
                SELECT m.id FROM messages m
                WHERE m.conversation_id = $1
                  AND m.sender_id <> $2
                  AND NOT EXISTS (
                      SELECT 1 FROM message_reads r
                      WHERE r.message_id = m.id AND r.user_id = $2
                  )
                ORDER BY m.created_at
                "#,
            )
            .bind(conversation_id)
            .bind(reader)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT id FROM messages
                WHERE conversation_id = $1 AND id = ANY($2)
                ORDER BY created_at
                "#,
            )
            .bind(conversation_id)
            .bind(message_ids)
            .fetch_all(&self.pool)
            .await?
        };
        let acknowledged: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
        if acknowledged.is_empty() {
            return Ok(acknowledged);
        }

        sqlx::query(
            r#"
            INSERT INTO message_reads (message_id, user_id, read_at)
            SELECT id, $2, $3 FROM UNNEST($1::uuid[]) AS id
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(&acknowledged)
        .bind(reader)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(acknowledged)
    }
}

#[async_trait]
impl IdentityStore for PgChatStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, avatar_url, role, is_verified
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<UserRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT id, name, avatar_url, role, is_verified
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(user_from_row).collect())
    }
}

fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        avatar_url: row.get("avatar_url"),
        role: UserRole::parse(row.get::<String, _>("role").as_str()),
        is_verified: row.get("is_verified"),
    }
}
