//! Background refresh of the tenant access token.

use std::sync::Arc;
use std::time::Duration;

use larkbot::LarkApi;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Refresh schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    /// Refresh this long before the token expires.
    pub margin: Duration,
    /// Never wait less than this between successful refreshes.
    pub min_delay: Duration,
    /// Wait this long after a failed refresh.
    pub retry_delay: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            margin: Duration::from_secs(60),
            min_delay: Duration::from_secs(5),
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl TokenSettings {
    /// Delay before the next refresh of a token valid for `expire_secs`.
    pub fn next_refresh(&self, expire_secs: u64) -> Duration {
        Duration::from_secs(expire_secs)
            .saturating_sub(self.margin)
            .max(self.min_delay)
    }
}

/// Keep the access token fresh until `shutdown` fires.
pub async fn refresh_loop(
    api: Arc<LarkApi>,
    settings: TokenSettings,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let delay = match api.refresh_access_token().await {
            Ok(expire) => {
                let delay = settings.next_refresh(expire);
                info!("Access token updated, next update in {}s", delay.as_secs());
                delay
            }
            Err(e) => {
                error!("Failed to update access token: {}", e);
                settings.retry_delay
            }
        };

        tokio::select! {
            _ = shutdown.recv() => {
                info!("Stopping access token refresh");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
