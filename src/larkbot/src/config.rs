//! Configuration for the Lark integration.
//!
//! Supports loading configuration from:
//! - Explicit values (command-line flags)
//! - Environment variables

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LarkError, LarkResult};

/// Default open platform endpoint.
pub const DEFAULT_API_BASE: &str = "https://open.feishu.cn/open-apis";

/// Configuration for the Lark integration.
#[derive(Clone)]
pub struct LarkConfig {
    /// Application id issued by the open platform.
    app_id: String,
    /// Application secret.
    app_secret: SecretString,
    /// API endpoint prefix, without a trailing slash.
    api_base: String,
    /// Open ids allowed to run privileged commands. Empty means everyone.
    masters: Vec<String>,
}

impl std::fmt::Debug for LarkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LarkConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("masters", &self.masters)
            .finish()
    }
}

impl LarkConfig {
    /// Create a new configuration with the application credentials.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: SecretString::new(app_secret.into().into()),
            api_base: DEFAULT_API_BASE.to_string(),
            masters: Vec::new(),
        }
    }

    /// Set the masters from a comma-separated list of open ids.
    pub fn with_masters(mut self, masters: &str) -> Self {
        self.masters = parse_masters(masters);
        self
    }

    /// Override the API endpoint prefix.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `LARK_APP_ID`
    /// - `LARK_APP_SECRET`
    ///
    /// Optional variables:
    /// - `LARK_MASTERS`
    /// - `LARK_API_BASE`
    pub fn from_env() -> LarkResult<Self> {
        let app_id = std::env::var("LARK_APP_ID")
            .map_err(|_| LarkError::Config("LARK_APP_ID not set".to_string()))?;

        let app_secret = std::env::var("LARK_APP_SECRET")
            .map_err(|_| LarkError::Config("LARK_APP_SECRET not set".to_string()))?;

        let mut config = Self::new(app_id, app_secret);

        if let Ok(masters) = std::env::var("LARK_MASTERS") {
            config = config.with_masters(&masters);
        }
        if let Ok(api_base) = std::env::var("LARK_API_BASE") {
            config = config.with_api_base(api_base);
        }

        debug!("Loaded Lark config from environment");
        Ok(config)
    }

    /// Get the application id.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Get the application secret.
    pub fn app_secret(&self) -> &str {
        self.app_secret.expose_secret()
    }

    /// Get the API endpoint prefix.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the configured masters.
    pub fn masters(&self) -> &[String] {
        &self.masters
    }

    /// Whether `open_id` may run privileged commands.
    ///
    /// Everyone is a master when no masters are configured.
    pub fn is_master(&self, open_id: &str) -> bool {
        self.masters.is_empty() || self.masters.iter().any(|m| m == open_id)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LarkResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(LarkError::Config("empty app id".to_string()));
        }
        if self.app_secret.expose_secret().trim().is_empty() {
            return Err(LarkError::Config("empty app secret".to_string()));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(LarkError::Config(format!(
                "API base must be an http(s) URL: {}",
                self.api_base
            )));
        }

        Ok(())
    }
}

/// Serializable view of the configuration (without secrets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LarkConfigMetadata {
    /// Application id.
    pub app_id: String,
    /// Whether a secret is configured.
    pub has_app_secret: bool,
    /// API endpoint prefix.
    pub api_base: String,
    /// Number of configured masters; zero means everyone.
    pub masters: usize,
}

impl From<&LarkConfig> for LarkConfigMetadata {
    fn from(config: &LarkConfig) -> Self {
        Self {
            app_id: config.app_id.clone(),
            has_app_secret: !config.app_secret.expose_secret().is_empty(),
            api_base: config.api_base.clone(),
            masters: config.masters.len(),
        }
    }
}

/// Split a comma-separated id list, trimming entries and dropping empty ones.
pub fn parse_masters(masters: &str) -> Vec<String> {
    masters
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
