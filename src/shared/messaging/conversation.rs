//! Conversation Data Structure
//!
//! A conversation is a 1:1 thread between exactly two users, optionally scoped
//! to a single listing. The pair plus the product scope forms the thread's
//! identity: the same two users talking about two different listings have two
//! conversations.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

use super::user::UserSummary;

/// Unordered pair of distinct participants, stored lowest id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "[Uuid; 2]", try_from = "[Uuid; 2]")]
pub struct ParticipantPair {
    low: Uuid,
    high: Uuid,
}

impl ParticipantPair {
    /// Build a pair from two user ids in any order
    pub fn new(a: Uuid, b: Uuid) -> Result<Self, SharedError> {
        match a.cmp(&b) {
            Ordering::Less => Ok(Self { low: a, high: b }),
            Ordering::Greater => Ok(Self { low: b, high: a }),
            Ordering::Equal => Err(SharedError::validation(
                "participants",
                "a conversation needs two distinct users",
            )),
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The participant that is not `self_id`, or `None` if `self_id` is not in the pair
    pub fn other(&self, self_id: Uuid) -> Option<Uuid> {
        if self.low == self_id {
            Some(self.high)
        } else if self.high == self_id {
            Some(self.low)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> [Uuid; 2] {
        [self.low, self.high]
    }
}

impl From<ParticipantPair> for [Uuid; 2] {
    fn from(pair: ParticipantPair) -> Self {
        pair.as_array()
    }
}

impl TryFrom<[Uuid; 2]> for ParticipantPair {
    type Error = SharedError;

    fn try_from(ids: [Uuid; 2]) -> Result<Self, Self::Error> {
        Self::new(ids[0], ids[1])
    }
}

/// Product scope of a thread
///
/// Callers always pass a scope explicitly; `General` is the "no listing" thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProductScope {
    General,
    Product(Uuid),
}

impl ProductScope {
    pub fn from_product_id(product_id: Option<Uuid>) -> Self {
        product_id.map_or(Self::General, Self::Product)
    }

    pub fn product_id(&self) -> Option<Uuid> {
        match self {
            Self::General => None,
            Self::Product(id) => Some(*id),
        }
    }

    /// Storage key: the product id, or `"general"`
    pub fn key(&self) -> String {
        match self {
            Self::General => "general".to_string(),
            Self::Product(id) => id.to_string(),
        }
    }
}

impl fmt::Display for ProductScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Identity of a thread: participant pair plus product scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub participants: ParticipantPair,
    pub scope: ProductScope,
}

impl ConversationKey {
    pub fn new(a: Uuid, b: Uuid, scope: ProductScope) -> Result<Self, SharedError> {
        Ok(Self {
            participants: ParticipantPair::new(a, b)?,
            scope,
        })
    }
}

/// A stored conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub participants: ParticipantPair,
    pub product_id: Option<Uuid>,
    /// Participant id -> unread count; entries appear on first increment
    pub unread_counts: HashMap<Uuid, u32>,
    pub last_message: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a fresh conversation for `key`
    pub fn new(key: ConversationKey, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            participants: key.participants,
            product_id: key.scope.product_id(),
            unread_counts: HashMap::new(),
            last_message: None,
            last_message_at: now,
            created_at: now,
        }
    }

    pub fn key(&self) -> ConversationKey {
        ConversationKey {
            participants: self.participants,
            scope: self.scope(),
        }
    }

    pub fn scope(&self) -> ProductScope {
        ProductScope::from_product_id(self.product_id)
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(user_id)
    }

    pub fn other_participant(&self, self_id: Uuid) -> Option<Uuid> {
        self.participants.other(self_id)
    }

    pub fn unread_for(&self, user_id: Uuid) -> u32 {
        self.unread_counts.get(&user_id).copied().unwrap_or(0)
    }

    /// Recency order used by list views and duplicate resolution:
    /// later `last_message_at` first, then higher id first.
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        other
            .last_message_at
            .cmp(&self.last_message_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Thread summary returned to the user who lists their conversations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Uuid,
    pub participants: [Uuid; 2],
    pub other_participant: UserSummary,
    pub product_id: Option<Uuid>,
    pub unread_count: u32,
    pub last_message: Option<String>,
    pub last_message_at: DateTime<Utc>,
}

/// Response for listing conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
}

/// Response after opening a conversation over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenConversationResponse {
    pub conversation: ConversationSummary,
}

/// `conversation:join` payload, also the body of `POST /api/chat/conversations`
///
/// `participantId` is accepted as another spelling of `otherUserId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinConversationRequest {
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default, alias = "participantId")]
    pub other_user_id: Option<Uuid>,
    #[serde(default)]
    pub product_id: Option<Uuid>,
}

/// Mark-read payload, shared by `POST .../read` and `message:read`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[serde(default)]
    pub message_ids: Vec<Uuid>,
}

/// Result of a read-mark
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub message_ids: Vec<Uuid>,
    pub unread_count: u32,
}
