//! Real-time Module
//!
//! Session tracking and the WebSocket gateway.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports
//! ├── broadcast.rs - EventRouter trait seen by the delivery coordinator
//! ├── registry.rs  - Per-process session and room registry
//! └── gateway.rs   - WebSocket upgrade and frame dispatch
//! ```
//!
//! # Delivery
//!
//! A user may hold several sessions (tabs). Personal events are fanned out
//! to every session of the user; room events go to sessions that joined the
//! conversation. Delivery is best-effort: a session whose socket is gone is
//! dropped from the registry on the next failed send.

pub mod broadcast;
pub mod gateway;
pub mod registry;

pub use broadcast::{EventRouter, SessionId};
pub use gateway::ws_handler;
pub use registry::SessionRegistry;
