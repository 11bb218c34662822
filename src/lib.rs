//! marketchat - Marketplace Messaging Core
//!
//! marketchat is the real-time conversation layer of a campus resale
//! marketplace: buyers and sellers talk in 1:1 threads, optionally scoped to a
//! single listing, over HTTP and a WebSocket gateway.
//!
//! # Overview
//!
//! - Conversation identity and deduplication (participant pair + product scope)
//! - Per-participant unread counters and last-message summaries
//! - An append-only message log with a monotonic ordering key
//! - At-most-once delivery: persist, update counters, then push
//!
//! # Module Structure
//!
//! - **`shared`** - Wire and domain types usable by clients
//!   - Conversations, messages, user summaries
//!   - Real-time event envelope and inbound client events
//!   - Chat configuration
//!
//! - **`backend`** - Server-side code (only compiled with the `server` feature)
//!   - Axum HTTP server and WebSocket gateway
//!   - Conversation directory, message log, delivery coordinator
//!   - Postgres and in-memory stores
//!
//! # Usage
//!
//! ```rust,no_run
//! use marketchat::backend::server::{config::ServerConfig, init::create_app};
//!
//! # async fn example() {
//! let config = ServerConfig::from_env().expect("invalid configuration");
//! let app = create_app(&config).await;
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Shared server state is `Arc`-wrapped and guarded by `tokio::sync::RwLock`;
//! each WebSocket session drains its own `mpsc` channel.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "server")]
pub mod backend;
