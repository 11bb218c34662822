/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Health check
 * 2. WebSocket gateway (authenticates its own handshake)
 * 3. API routes (behind the auth middleware)
 * 4. Fallback handler (404)
 */

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::realtime::gateway::ws_handler;
use crate::backend::realtime::registry::SessionRegistry;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state containing the messaging core
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/chat/ws", get(ws_handler));

    let router = configure_api_routes(router, app_state.clone());

    let router = router
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    router.with_state(app_state)
}

async fn health(State(sessions): State<Arc<SessionRegistry>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": sessions.session_count().await,
    }))
}
