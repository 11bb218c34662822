/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including store selection, state creation, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Load the optional database (Postgres store, or in-memory fallback)
 * 2. Build `AppState` (directory, coordinator, session registry)
 * 3. Create and configure the router
 * 4. Start the periodic session sweep
 */

use std::time::Duration;

use axum::Router;

use crate::backend::auth::JwtKeys;
use crate::backend::messaging::{ChatStores, MemoryStore};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Error Handling
///
/// Missing or unreachable database: the server continues on the in-memory
/// store. Migration failures are logged and do not prevent startup.
pub async fn create_app(config: &ServerConfig) -> Router<()> {
    tracing::info!("Initializing marketchat server");

    let stores = match load_database(config.database_url.as_deref()).await {
        Some(pool) => ChatStores::postgres(pool),
        None => ChatStores::memory(std::sync::Arc::new(MemoryStore::new())),
    };

    let app_state = AppState::new(stores, JwtKeys::new(&config.jwt_secret), config.chat.clone());

    let app = create_router(app_state.clone());
    spawn_session_sweep(&app_state, config.chat.session_sweep_interval);

    tracing::info!("Router configured with periodic session sweep");

    app
}

/// Periodically drop sessions whose socket writer has exited
pub fn spawn_session_sweep(app_state: &AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    let sessions = app_state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let pruned = sessions.prune_closed().await;
            if pruned > 0 {
                tracing::debug!("[Gateway] Swept {} closed session(s)", pruned);
            }
        }
    })
}
