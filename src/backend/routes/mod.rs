//! Routes Module
//!
//! HTTP route configuration.
//!
//! # Routes
//!
//! | Method | Path                                    | Auth          |
//! |--------|-----------------------------------------|---------------|
//! | GET    | `/health`                               | none          |
//! | GET    | `/api/chat/ws`                          | handshake     |
//! | GET    | `/api/chat/conversations`               | bearer        |
//! | POST   | `/api/chat/conversations`               | bearer        |
//! | GET    | `/api/chat/conversations/{id}/messages` | bearer        |
//! | POST   | `/api/chat/conversations/{id}/read`     | bearer        |
//! | POST   | `/api/chat/messages`                    | bearer        |

/// Main router creation
pub mod router;

/// Chat API routes behind the auth middleware
pub mod api_routes;

pub use router::create_router;
