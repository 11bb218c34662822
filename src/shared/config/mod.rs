//! Chat configuration module
//!
//! Tunables of the messaging core. The server fills these from the
//! environment (see `backend::server::config`); tests build them directly.

use std::time::Duration;

use thiserror::Error;

/// Largest accepted `max_page_size`
pub const PAGE_SIZE_CEILING: u32 = 1000;

/// Messaging core configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Page size when a message listing does not pass `limit`
    pub default_page_size: u32,
    /// Upper bound for `limit`
    pub max_page_size: u32,
    /// Broadcast `user:online` / `user:offline`
    pub presence_enabled: bool,
    /// Interval of the closed-session sweep
    pub session_sweep_interval: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 200,
            presence_enabled: true,
            session_sweep_interval: Duration::from_secs(300),
        }
    }
}

impl ChatConfig {
    /// Create a new ChatConfigBuilder
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 || self.max_page_size > PAGE_SIZE_CEILING {
            return Err(ConfigError::InvalidValue {
                name: "max_page_size",
                reason: format!("must be between 1 and {}", PAGE_SIZE_CEILING),
            });
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidValue {
                name: "default_page_size",
                reason: format!("must be between 1 and {}", self.max_page_size),
            });
        }
        if self.session_sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "session_sweep_interval",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Effective page size for a requested `limit`
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

/// Builder for ChatConfig
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    default_page_size: Option<u32>,
    max_page_size: Option<u32>,
    presence_enabled: Option<bool>,
    session_sweep_interval: Option<Duration>,
}

impl ChatConfigBuilder {
    pub fn default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = Some(size);
        self
    }

    pub fn max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = Some(size);
        self
    }

    pub fn presence_enabled(mut self, enabled: bool) -> Self {
        self.presence_enabled = Some(enabled);
        self
    }

    pub fn session_sweep_interval(mut self, interval: Duration) -> Self {
        self.session_sweep_interval = Some(interval);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ChatConfig, ConfigError> {
        let defaults = ChatConfig::default();
        let config = ChatConfig {
            default_page_size: self.default_page_size.unwrap_or(defaults.default_page_size),
            max_page_size: self.max_page_size.unwrap_or(defaults.max_page_size),
            presence_enabled: self.presence_enabled.unwrap_or(defaults.presence_enabled),
            session_sweep_interval: self
                .session_sweep_interval
                .unwrap_or(defaults.session_sweep_interval),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("could not parse {name} from {value:?}")]
    Unparsable { name: &'static str, value: String },
}
