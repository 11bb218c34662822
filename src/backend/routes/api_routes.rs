/**
 * API Route Handlers
 *
 * This module mounts the chat REST endpoints. Every route here sits behind
 * `auth_middleware`; the WebSocket route authenticates its own handshake
 * and is mounted by the router outside this layer.
 *
 * # Routes
 *
 * - `GET  /api/chat/conversations` - Deduplicated thread list
 * - `POST /api/chat/conversations` - Get or create a thread with a user
 * - `GET  /api/chat/conversations/{id}/messages` - Message page
 * - `POST /api/chat/conversations/{id}/read` - Mark messages read
 * - `POST /api/chat/messages` - Send a message
 */

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::backend::messaging::handlers::{
    list_conversations, list_messages, mark_read, open_conversation, send_message,
};
use crate::backend::middleware::auth_middleware;
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// # Authentication
///
/// All routes require a JWT in the `Authorization: Bearer` header.
pub fn configure_api_routes(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    let chat = Router::new()
        .route(
            "/api/chat/conversations",
            get(list_conversations).post(open_conversation),
        )
        .route("/api/chat/conversations/{id}/messages", get(list_messages))
        .route("/api/chat/conversations/{id}/read", post(mark_read))
        .route("/api/chat/messages", post(send_message))
        .layer(middleware::from_fn_with_state(app_state, auth_middleware));

    router.merge(chat)
}
