//! Authentication Module
//!
//! Token verification for the chat API and the WebSocket handshake. Token
//! issuance and user records belong to the marketplace's identity service;
//! this module only checks signatures and resolves the subject.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! └── sessions.rs     - JWT claims, keys and verification
//! ```
//!
//! # Security
//!
//! - HS256 tokens signed with `JWT_SECRET`
//! - Expired or malformed tokens return 401
//! - The subject must exist in the identity store (checked by the middleware
//!   and the gateway, not here)

/// JWT token management
pub mod sessions;

pub use sessions::{Claims, JwtKeys};
