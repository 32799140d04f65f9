//! Application state shared across request handlers.

use std::sync::Arc;

use larkbot::LarkApi;

use crate::config::ServerConfig;
use crate::error::AppResult;

/// Application state shared across request handlers.
#[derive(Debug)]
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,
    /// Lark API client.
    pub api: Arc<LarkApi>,
}

impl AppState {
    /// Create the state, building the API client from the configuration.
    pub fn new(config: ServerConfig) -> AppResult<Self> {
        config.validate()?;
        let api = Arc::new(LarkApi::new(config.lark.clone())?);

        Ok(Self { config, api })
    }
}

#[cfg(test)]
impl AppState {
    /// State pointing at a mock platform, with a token already obtained.
    pub(crate) async fn for_mock_server(server: &wiremock::MockServer, masters: &str) -> Arc<Self> {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, ResponseTemplate};

        Mock::given(method("POST"))
            .and(path("/auth/v3/tenant_access_token/internal/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "ok",
                "tenant_access_token": "t-test",
                "expire": 7200
            })))
            .mount(server)
            .await;

        let lark = larkbot::LarkConfig::new("cli_test", "secret")
            .with_api_base(server.uri())
            .with_masters(masters);
        let state = Self::new(ServerConfig::new(lark)).unwrap();
        state.api.refresh_access_token().await.unwrap();
        Arc::new(state)
    }
}
