//! Messaging Module
//!
//! This module contains the data structures for the messaging core:
//!
//! - `Conversation` - A 1:1 thread, optionally scoped to a listing
//! - `ChatMessage` - A message in a conversation
//! - `UserRecord` - Identity fields the core needs for display and auth
//!
//! # Usage
//!
//! ```rust
//! use marketchat::shared::messaging::{ChatMessage, Conversation, ProductScope};
//! ```

pub mod conversation;
pub mod message;
pub mod user;

pub use conversation::{
    Conversation, ConversationKey, ConversationSummary, JoinConversationRequest,
    ListConversationsResponse, MarkReadRequest, OpenConversationResponse, ParticipantPair,
    ProductScope, ReadReceipt,
};
pub use message::{
    ChatMessage, ListMessagesQuery, ListMessagesResponse, MessageView, SendMessageRequest,
    SendMessageResponse,
};
pub use user::{UserRecord, UserRole, UserSummary};
