//! API integration tests
//!
//! Integration tests for the `/api/chat` endpoints

mod chat_test;
mod concurrency_test;
mod errors_test;
