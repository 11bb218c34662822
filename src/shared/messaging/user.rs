//! Identity records as seen by the messaging core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

/// A user record from the identity store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
}

impl UserRecord {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar_url: None,
            role: UserRole::User,
            is_verified: false,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: Some(self.name.clone()),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Display fields embedded in messages and thread lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserSummary {
    /// Summary for a user the identity store no longer knows about
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: None,
            avatar_url: None,
        }
    }
}
