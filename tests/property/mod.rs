//! Property-based tests

mod dedup_proptest;
mod unread_proptest;
