//! Integration tests
//!
//! Drive the assembled router over the in-memory store

pub mod api;
pub mod realtime;
