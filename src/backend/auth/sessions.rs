/**
 * Session Tokens
 *
 * HS256 JWT verification for HTTP requests and WebSocket handshakes.
 * Tokens are issued by the marketplace's identity service; `create_token`
 * exists for tooling and tests that need a valid credential.
 */

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::BackendError;

/// Development fallback used when `JWT_SECRET` is unset
pub const DEV_SECRET: &str = "marketchat-dev-secret-change-me";

/// Token lifetime for `create_token` (30 days)
const TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Legacy subject field written by older issuers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
}

impl Claims {
    /// The authenticated user id
    pub fn user_id(&self) -> Result<Uuid, BackendError> {
        let subject = self
            .sub
            .as_deref()
            .or(self.id.as_deref())
            .ok_or_else(|| BackendError::unauthenticated("token has no subject"))?;
        Uuid::parse_str(subject)
            .map_err(|_| BackendError::unauthenticated("token subject is not a user id"))
    }
}

/// Signing and verification keys
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Create a JWT token for a user
    pub fn create_token(&self, user_id: Uuid) -> Result<String, BackendError> {
        let now = unix_now();
        let claims = Claims {
            sub: Some(user_id.to_string()),
            id: None,
            exp: now + TOKEN_TTL_SECS,
            iat: now,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| BackendError::unauthenticated(format!("could not sign token: {}", e)))
    }

    /// Verify and decode a JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, BackendError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("[Auth] Rejected token: {}", e);
                BackendError::unauthenticated("invalid or expired token")
            })
    }

    /// User id carried by a valid token
    pub fn user_id_from_token(&self, token: &str) -> Result<Uuid, BackendError> {
        self.verify_token(token)?.user_id()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
