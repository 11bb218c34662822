//! Messaging Module
//!
//! The conversation and message core.
//!
//! # Module Structure
//!
//! ```text
//! messaging/
//! ├── store.rs       - Store traits and StoreError
//! ├── memory.rs      - In-memory store
//! ├── db.rs          - Postgres store
//! ├── clock.rs       - Monotonic createdAt clock
//! ├── directory.rs   - Conversation Directory and thread dedup
//! ├── log.rs         - Message Log
//! ├── coordinator.rs - Delivery Coordinator
//! └── handlers.rs    - HTTP handlers
//! ```

pub mod clock;
pub mod coordinator;
pub mod db;
pub mod directory;
pub mod handlers;
pub mod log;
pub mod memory;
pub mod store;

pub use clock::MonotonicClock;
pub use coordinator::DeliveryCoordinator;
pub use directory::{dedup_threads, ConversationDirectory};
pub use log::{MessageLog, MessagePage};
pub use memory::MemoryStore;
pub use store::{ChatStores, ConversationStore, IdentityStore, MessageStore, StoreError};
