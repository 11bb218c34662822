/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are returned by the messaging core and converted to HTTP
 * responses or WebSocket `error` events at the edge.
 *
 * # Error Kinds
 *
 * Every error belongs to exactly one [`ErrorKind`]:
 *
 * - `validation` - The request is malformed (missing receiver, empty text, self-send)
 * - `authorization` - The caller is not authenticated, or not a participant
 * - `not_found` - The conversation or user does not exist
 * - `transport` - A realtime push could not be handed to a session
 * - `internal` - Store failures and other server-side faults
 *
 * # Status Code Mapping
 *
 * | Variant           | Status |
 * |-------------------|--------|
 * | `ValidationError` | 400    |
 * | `Unauthenticated` | 401    |
 * | `Forbidden`       | 403    |
 * | `NotFound`        | 404    |
 * | `TransportError`  | 502    |
 * | `Store`           | 500    |
 */

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::backend::messaging::store::StoreError;
use crate::shared::SharedError;

/// Error category reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    Transport,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transport => "transport",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use marketchat::backend::error::BackendError;
///
/// let err = BackendError::validation("text", "message text or an attachment is required");
/// let err = BackendError::not_found("conversation", "8c0e...");
/// let err = BackendError::forbidden("not a participant in this conversation");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request failed a field check
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Offending field, in wire (camelCase) spelling
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Missing or invalid credential
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// Authenticated, but not allowed to touch this resource
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// A referenced resource does not exist
    #[error("{resource} not found: {id}")]
    NotFound {
        resource: &'static str,
        id: String,
    },

    /// Realtime delivery failed
    #[error("Transport error: {message}")]
    TransportError { message: String },

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Error category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError { .. } => ErrorKind::Validation,
            Self::Unauthenticated { .. } | Self::Forbidden { .. } => ErrorKind::Authorization,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TransportError { .. } => ErrorKind::Transport,
            Self::Store(_) => ErrorKind::Internal,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => ErrorKind::Validation,
                SharedError::SerializationError { .. } => ErrorKind::Internal,
            },
            Self::SerializationError(_) => ErrorKind::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::TransportError { .. } => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    ///
    /// Internal failures are reported without their cause; the cause is logged.
    pub fn message(&self) -> String {
        match self {
            Self::ValidationError { message, .. } => message.clone(),
            Self::Unauthenticated { message } => message.clone(),
            Self::Forbidden { message } => message.clone(),
            Self::NotFound { resource, .. } => format!("{} not found", resource),
            Self::TransportError { message } => message.clone(),
            Self::Store(_) => "internal storage error".to_string(),
            Self::SharedError(SharedError::ValidationError { message, .. }) => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }

    /// Offending field for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
            Self::SharedError(SharedError::ValidationError { field, .. }) => Some(field),
            _ => None,
        }
    }
}
