//! Server configuration.

use std::net::SocketAddr;

use larkbot::LarkConfig;

use crate::error::{AppError, AppResult};
use crate::token::TokenSettings;

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:32123";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (e.g., "127.0.0.1:32123").
    pub listen_addr: String,

    /// Lark application settings.
    pub lark: LarkConfig,

    /// Access token refresh schedule.
    pub token: TokenSettings,
}

impl ServerConfig {
    /// Create a configuration listening on the default address.
    pub fn new(lark: LarkConfig) -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            lark,
            token: TokenSettings::default(),
        }
    }

    /// Set the listen address.
    pub fn with_listen_addr(mut self, listen_addr: impl Into<String>) -> Self {
        self.listen_addr = listen_addr.into();
        self
    }

    /// Parse the listen address.
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| AppError::Config(format!("invalid listen address {}: {}", self.listen_addr, e)))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        self.socket_addr()?;
        self.lark.validate()?;
        Ok(())
    }
}

/// Map a verbosity name to a tracing level directive.
///
/// Accepts `debug`, `info`, `notice`, `warning`, `error` and `critical`;
/// anything else means `info`.
pub fn log_level(verbosity: &str) -> &'static str {
    match verbosity.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warning" | "warn" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    }
}
