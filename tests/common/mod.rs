//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - An in-memory application with seeded users and tokens
//! - Request helpers for the HTTP API
//! - WebSocket helpers for the gateway
//! - Custom assertion macros

pub mod assertions;
pub mod socket;

pub use fixtures::*;
pub use socket::*;
