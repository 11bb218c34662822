/**
 * Error Conversion
 *
 * All backend errors implement `IntoResponse` from Axum, allowing them to be
 * returned directly from handlers.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "kind": "validation",
 *   "status": 400
 * }
 * ```
 *
 * Validation errors also carry the offending `field`.
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::{BackendError, ErrorKind};
use crate::shared::RealtimeEvent;

impl BackendError {
    /// JSON body for this error
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
            "status": self.status_code().as_u16(),
        });
        if let Some(field) = self.field() {
            body["field"] = serde_json::Value::String(field.to_string());
        }
        body
    }

    /// `error` event for the session that caused this error
    pub fn to_event(&self) -> RealtimeEvent {
        let mut event = RealtimeEvent::error(self.kind().as_str(), self.message());
        if let Some(field) = self.field() {
            event.data["field"] = serde_json::Value::String(field.to_string());
        }
        event
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.kind() == ErrorKind::Internal {
            tracing::error!("[Error] {} ({})", self, status);
        } else {
            tracing::debug!("[Error] {} ({})", self, status);
        }
        (status, Json(self.to_json())).into_response()
    }
}
