//! Server configuration
//!
//! Environment:
//! - KANBAN_BIND_ADDR: listen address (optional, default 127.0.0.1:3030)
//! - KANBAN_JWT_SECRET: token signing secret (required, min 32 chars)
//! - KANBAN_OUTBOUND_BUFFER: frames queued per connection before delivery
//!   to it fails (optional, default 256)
//! - KANBAN_ACCESS_TOKEN_TTL: lifetime of issued tokens in seconds
//!   (optional, default 3600)

use thiserror::Error;

use crate::auth::JwtAuth;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KANBAN_JWT_SECRET is not set")]
    MissingSecret,
    #[error("KANBAN_JWT_SECRET must be at least {0} characters")]
    ShortSecret(usize),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub outbound_buffer: usize,
    pub access_token_ttl: i64,
}

impl ServerConfig {
    pub const DEFAULT_BIND_ADDR: &'static str = "127.0.0.1:3030";
    pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;
    pub const DEFAULT_ACCESS_TOKEN_TTL: i64 = 3600;

    /// Defaults around an explicit secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: Self::DEFAULT_BIND_ADDR.to_string(),
            jwt_secret: jwt_secret.into(),
            outbound_buffer: Self::DEFAULT_OUTBOUND_BUFFER,
            access_token_ttl: Self::DEFAULT_ACCESS_TOKEN_TTL,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("KANBAN_JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        if secret.len() < JwtAuth::MIN_SECRET_LEN {
            return Err(ConfigError::ShortSecret(JwtAuth::MIN_SECRET_LEN));
        }

        let mut config = Self::new(secret);

        if let Some(addr) = lookup("KANBAN_BIND_ADDR").filter(|a| !a.trim().is_empty()) {
            config.bind_addr = addr.trim().to_string();
        }

        if let Some(buffer) = lookup("KANBAN_OUTBOUND_BUFFER") {
            match buffer.parse::<usize>() {
                Ok(n) if n > 0 => config.outbound_buffer = n,
                _ => tracing::warn!(
                    "Ignoring KANBAN_OUTBOUND_BUFFER={}, using {}",
                    buffer,
                    Self::DEFAULT_OUTBOUND_BUFFER
                ),
            }
        }

        if let Some(ttl) = lookup("KANBAN_ACCESS_TOKEN_TTL") {
            if let Ok(seconds) = ttl.parse::<i64>() {
                config.access_token_ttl = seconds;
            }
        }

        Ok(config)
    }
}
