//! Server Module
//!
//! Server initialization, application state, and configuration.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports
//! ├── state.rs  - AppState and FromRef impls
//! ├── config.rs - Environment configuration and database loading
//! └── init.rs   - Store selection, router creation, session sweep
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use marketchat::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(&config).await;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::ServerConfig;
pub use init::create_app;
pub use state::AppState;
