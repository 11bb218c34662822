/**
 * Authentication Middleware
 *
 * Protects the `/api/chat` routes. Extracts the bearer token, verifies it,
 * checks that the user exists in the identity store and attaches the user to
 * the request extensions for the `AuthUser` extractor.
 *
 * The WebSocket handshake runs the same `authenticate` check before upgrading.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::messaging::UserRecord;

/// Authenticated user data extracted from JWT token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
}

impl From<UserRecord> for AuthenticatedUser {
    fn from(user: UserRecord) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify a token and resolve its subject in the identity store
pub async fn authenticate(state: &AppState, token: &str) -> Result<AuthenticatedUser, BackendError> {
    let user_id = state.keys.user_id_from_token(token)?;
    match state.identity.get_user(user_id).await? {
        Some(user) => Ok(user.into()),
        None => {
            tracing::warn!("[Auth] Token subject {} is not a known user", user_id);
            Err(BackendError::unauthenticated("unknown user"))
        }
    }
}

/// Authentication middleware
///
/// Returns 401 Unauthorized if the token is missing, invalid, or names an
/// unknown user.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::debug!("[Auth] Missing or malformed Authorization header");
        BackendError::unauthenticated("missing bearer token")
    })?;
    let user = authenticate(&app_state, token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Axum extractor for the user attached by `auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
                BackendError::unauthenticated("not authenticated")
            })
    }
}
