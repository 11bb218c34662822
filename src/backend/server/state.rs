/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the composition root of the messaging core. It wires one
 * set of stores into the directory, the message log and the delivery
 * coordinator, and owns the process-wide session registry that the
 * coordinator routes events through.
 *
 * # Thread Safety
 *
 * Every component is `Arc`-shared and internally synchronized, so cloning
 * `AppState` per request is cheap.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::JwtKeys;
use crate::backend::messaging::{
    ChatStores, ConversationDirectory, DeliveryCoordinator, IdentityStore, MemoryStore,
    MessageLog, MonotonicClock,
};
use crate::backend::realtime::registry::SessionRegistry;
use crate::backend::auth::sessions::DEV_SECRET;
use crate::shared::ChatConfig;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ChatConfig>,
    pub keys: Arc<JwtKeys>,
    pub identity: Arc<dyn IdentityStore>,
    pub directory: Arc<ConversationDirectory>,
    /// Live WebSocket sessions of this process
    pub sessions: Arc<SessionRegistry>,
    pub coordinator: Arc<DeliveryCoordinator>,
}

impl AppState {
    pub fn new(stores: ChatStores, keys: JwtKeys, config: ChatConfig) -> Self {
        let clock = Arc::new(MonotonicClock::new());
        let directory = Arc::new(ConversationDirectory::new(
            stores.conversations,
            clock.clone(),
        ));
        let log = Arc::new(MessageLog::new(
            stores.messages,
            directory.clone(),
            clock,
            config.clone(),
        ));
        let sessions = Arc::new(SessionRegistry::new());
        let coordinator = Arc::new(DeliveryCoordinator::new(
            directory.clone(),
            log,
            stores.identity.clone(),
            sessions.clone(),
        ));

        Self {
            config: Arc::new(config),
            keys: Arc::new(keys),
            identity: stores.identity,
            directory,
            sessions,
            coordinator,
        }
    }

    /// State over a fresh in-memory store signed with the development secret
    ///
    /// The store handle is returned so callers can seed users.
    pub fn in_memory(config: ChatConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self::new(
            ChatStores::memory(store.clone()),
            JwtKeys::new(DEV_SECRET),
            config,
        );
        (state, store)
    }
}

impl FromRef<AppState> for Arc<DeliveryCoordinator> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.coordinator.clone()
    }
}

impl FromRef<AppState> for Arc<SessionRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}
