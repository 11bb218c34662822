//! Middleware Module
//!
//! This module contains the HTTP middleware for the backend server.
//!
//! - **`auth`** - Bearer-token authentication for the chat API
//! - **`extract`** - `Json`/`Path`/`Query` wrappers that reject with `BackendError`
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::middleware;
//! use marketchat::backend::middleware::auth_middleware;
//!
//! let protected = api_routes.layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
//! ```

pub mod auth;
pub mod extract;

pub use auth::{auth_middleware, authenticate, bearer_token, AuthUser, AuthenticatedUser};
pub use extract::{ApiJson, ApiPath, ApiQuery};
