//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and its clients: the conversation and message model, the
//! real-time event envelope, and configuration types.
//!
//! # Overview
//!
//! The shared module has no server dependencies, so a client crate can link
//! it with `default-features = false` to speak the same wire format.

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Chat configuration
pub mod config;

/// Conversation, message and identity types
pub mod messaging;

/// Re-export commonly used types for convenience
pub use event::{ClientEvent, EventName, RealtimeEvent};
pub use error::SharedError;
pub use config::{ChatConfig, ChatConfigBuilder, ConfigError};
