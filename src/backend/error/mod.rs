//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions and kinds
//! └── conversion.rs - HTTP response and realtime event conversion
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use marketchat::backend::error::BackendError;
//! use axum::response::Response;
//!
//! # async fn example() -> Result<Response, BackendError> {
//! // Handler can return BackendError directly
//! # Ok(Response::new("OK".into()))
//! # }
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{BackendError, ErrorKind};
