/**
 * Server Configuration
 *
 * This module loads server configuration from environment variables (after
 * `dotenv` has read `.env`) and opens the optional PostgreSQL pool.
 *
 * # Environment
 *
 * | Variable                  | Default                   |
 * |---------------------------|---------------------------|
 * | `SERVER_PORT`             | `5050`                    |
 * | `DATABASE_URL`            | unset: in-memory store    |
 * | `JWT_SECRET`              | development secret (warn) |
 * | `CHAT_DEFAULT_PAGE_SIZE`  | `50`                      |
 * | `CHAT_MAX_PAGE_SIZE`      | `200`                     |
 * | `CHAT_PRESENCE_ENABLED`   | `true`                    |
 * | `CHAT_SESSION_SWEEP_SECS` | `300`                     |
 *
 * # Error Handling
 *
 * Unparsable or out-of-range values are configuration errors. A database
 * that cannot be reached is not: the server logs it and falls back to the
 * in-memory store.
 */

use std::str::FromStr;
use std::time::Duration;

use sqlx::PgPool;

use crate::backend::auth::sessions::DEV_SECRET;
use crate::shared::config::{ChatConfig, ConfigError};

pub const DEFAULT_PORT: u16 = 5050;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub chat: ChatConfig,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value if set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut chat = ChatConfig::builder();
        if let Some(size) = parse_var(&lookup, "CHAT_DEFAULT_PAGE_SIZE")? {
            chat = chat.default_page_size(size);
        }
        if let Some(size) = parse_var(&lookup, "CHAT_MAX_PAGE_SIZE")? {
            chat = chat.max_page_size(size);
        }
        if let Some(enabled) = parse_var(&lookup, "CHAT_PRESENCE_ENABLED")? {
            chat = chat.presence_enabled(enabled);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CHAT_SESSION_SWEEP_SECS")? {
            chat = chat.session_sweep_interval(Duration::from_secs(secs));
        }

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set. Using the development secret.");
                DEV_SECRET.to_string()
            }
        };

        Ok(Self {
            port: parse_var(&lookup, "SERVER_PORT")?.unwrap_or(DEFAULT_PORT),
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            jwt_secret,
            chat: chat.build()?,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparsable { name, value }),
    }
}

/// Load and initialize database connection pool
///
/// Connects to `database_url` and runs the embedded migrations.
///
/// # Returns
///
/// - `Some(PgPool)` if the database is reachable
/// - `None` if no URL is configured or the connection fails
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let Some(database_url) = database_url else {
        tracing::warn!("DATABASE_URL not set. Running on the in-memory store.");
        return None;
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Running on the in-memory store.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
