//! Backend Module
//!
//! This module contains all server-side code for the marketplace messaging
//! core: an Axum HTTP server with a WebSocket gateway, the conversation
//! directory, the message log and the delivery coordinator.
//!
//! This module is only compiled when the `server` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`messaging`** - Stores, directory, log, coordinator and REST handlers
//! - **`realtime`** - Session registry and WebSocket gateway
//! - **`auth`** - JWT verification
//! - **`middleware`** - Bearer-token authentication middleware
//! - **`error`** - Backend error type and its HTTP / event encodings
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs       - Module exports and documentation
//! ├── server/      - Server initialization and state
//! ├── routes/      - Route configuration
//! ├── messaging/   - Conversations and messages
//! ├── realtime/    - Sessions and gateway
//! ├── auth/        - Token verification
//! ├── middleware/  - Request middleware
//! └── error/       - Error types
//! ```
//!
//! # Send Flow
//!
//! A `message:send` (socket) or `POST /api/chat/messages` (REST) goes
//! through `DeliveryCoordinator::send`:
//!
//! 1. resolve or create the conversation
//! 2. persist the message
//! 3. bump the receiver's unread counter
//! 4. update the conversation's last-message summary
//! 5. fan out `conversation:message` to the room
//! 6. fan out `message:receive` to every session of the receiver
//!
//! Failures before step 5 are returned to the caller and nothing is fanned
//! out. Fan-out itself is best-effort.
//!
//! # Thread Safety
//!
//! - `Arc` for shared components
//! - `tokio::sync::RwLock` inside the in-memory store and the registry
//! - Database pool is thread-safe

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Real-time sessions and gateway
pub mod realtime;

/// Backend error types
pub mod error;

/// Token verification
pub mod auth;

/// Middleware for request processing
pub mod middleware;

/// Conversations, messages and delivery
pub mod messaging;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};
