//! Lark open platform API client.
//!
//! Every call goes through [`LarkApi::execute`], which logs the exchange,
//! maps HTTP failures and unwraps the `{code, msg, data}` envelope the
//! platform puts around each response.
//!
//! # Example
//!
//! ```rust,ignore
//! use larkbot::{LarkApi, LarkConfig};
//!
//! let api = LarkApi::new(LarkConfig::from_env()?)?;
//! api.refresh_access_token().await?;
//! api.send_message("oc_123", "hello").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::LarkConfig;
use crate::error::{LarkApiError, LarkError, LarkResult};
use crate::messages::Post;

/// Request timeout for every API call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Page size used when listing chats.
const LIST_PAGE_SIZE: &str = "200";

/// Response envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> LarkResult<T> {
        self.data
            .ok_or_else(|| LarkError::InvalidPayload("missing data in response".to_string()))
    }
}

/// Response of the tenant access token endpoint.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    #[serde(default)]
    expire: u64,
}

#[derive(Debug, Deserialize)]
struct ChatIdData {
    chat_id: String,
}

#[derive(Debug, Deserialize)]
struct MessageIdData {
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct ChatListData {
    #[serde(default)]
    groups: Vec<ChatSummary>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    page_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoData {
    #[serde(default)]
    user_infos: Vec<UserInfo>,
}

/// A chat as returned by the chat listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// Chat id (`oc_...`).
    pub chat_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Owner's open id.
    #[serde(default)]
    pub owner_open_id: String,
}

/// A chat member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMember {
    /// Member's open id.
    pub open_id: String,
    /// Member's tenant user id.
    #[serde(default)]
    pub user_id: String,
}

/// Detailed chat information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInfo {
    /// Chat id.
    pub chat_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Owner's open id.
    #[serde(default)]
    pub owner_open_id: String,
    /// Members of the chat.
    #[serde(default)]
    pub members: Vec<ChatMember>,
}

impl ChatInfo {
    /// Open ids of all members, in listing order.
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.open_id.clone()).collect()
    }
}

/// Basic user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Open id.
    pub open_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// English name.
    #[serde(default)]
    pub en_name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
}

/// Chat administration operations used by the command objects.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Create a chat named `name` with `owner_open_id` as its first member.
    async fn create_chat(&self, name: &str, owner_open_id: &str) -> LarkResult<String>;

    /// Add users to a chat.
    async fn add_users_to_chat(&self, chat_id: &str, open_ids: &[String]) -> LarkResult<()>;

    /// Remove users from a chat.
    async fn remove_users_from_chat(&self, chat_id: &str, open_ids: &[String])
    -> LarkResult<()>;

    /// Disband a chat.
    async fn destroy_chat(&self, chat_id: &str) -> LarkResult<()>;

    /// Fetch chat details including members.
    async fn chat_info(&self, chat_id: &str) -> LarkResult<ChatInfo>;

    /// List every chat the bot is in.
    async fn list_chats(&self) -> LarkResult<Vec<ChatSummary>>;

    /// Fetch profiles of the given users.
    async fn user_info(&self, open_ids: &[String]) -> LarkResult<Vec<UserInfo>>;
}

/// HTTP client for the Lark open platform.
pub struct LarkApi {
    /// Lark configuration.
    config: LarkConfig,
    /// HTTP client for API calls.
    client: reqwest::Client,
    /// Current tenant access token.
    access_token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for LarkApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LarkApi")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LarkApi {
    /// Create a client with the given configuration.
    pub fn new(config: LarkConfig) -> LarkResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LarkError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            access_token: RwLock::new(None),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &LarkConfig {
        &self.config
    }

    /// Whether a tenant access token has been obtained.
    pub async fn has_access_token(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    /// Obtain a fresh tenant access token.
    ///
    /// Returns the token lifetime in seconds.
    pub async fn refresh_access_token(&self) -> LarkResult<u64> {
        let body = json!({
            "app_id": self.config.app_id(),
            "app_secret": self.config.app_secret(),
        });
        let path = "/auth/v3/tenant_access_token/internal/";
        debug!("-> POST {}", path);

        let response = self.client.post(self.url(path)).json(&body).send().await?;
        let text = Self::read_body(path, response).await?;
        let data: AccessTokenResponse = serde_json::from_str(&text)?;

        if data.code != 0 {
            return Err(LarkError::Auth(format!(
                "tenant access token: {}: {}",
                data.code, data.msg
            )));
        }
        if data.tenant_access_token.is_empty() {
            return Err(LarkError::InvalidPayload(
                "missing tenant_access_token in response".to_string(),
            ));
        }

        *self.access_token.write().await = Some(SecretString::new(
            data.tenant_access_token.into_boxed_str(),
        ));
        Ok(data.expire)
    }

    /// Send a text message to a chat. Returns the message id.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> LarkResult<String> {
        let body = json!({
            "chat_id": chat_id,
            "msg_type": "text",
            "content": { "text": text },
        });
        let data: MessageIdData = self.post("/message/v4/send/", &body).await?.into_data()?;
        Ok(data.message_id)
    }

    /// Send a rich-text post to a chat. Returns the message id.
    pub async fn send_post(&self, chat_id: &str, post: &Post) -> LarkResult<String> {
        let body = json!({
            "chat_id": chat_id,
            "msg_type": "post",
            "content": { "post": post },
        });
        let data: MessageIdData = self.post("/message/v4/send/", &body).await?.into_data()?;
        Ok(data.message_id)
    }

    /// Create a chat. Returns its id.
    pub async fn create_chat(&self, name: &str, owner_open_id: &str) -> LarkResult<String> {
        let body = json!({
            "name": name,
            "open_ids": [owner_open_id],
        });
        let data: ChatIdData = self.post("/chat/v4/create/", &body).await?.into_data()?;
        Ok(data.chat_id)
    }

    /// Add users to a chat.
    pub async fn add_users_to_chat(&self, chat_id: &str, open_ids: &[String]) -> LarkResult<()> {
        let body = json!({ "chat_id": chat_id, "open_ids": open_ids });
        self.post::<IgnoredAny>("/chat/v4/chatter/add/", &body).await?;
        Ok(())
    }

    /// Remove users from a chat.
    pub async fn remove_users_from_chat(
        &self,
        chat_id: &str,
        open_ids: &[String],
    ) -> LarkResult<()> {
        let body = json!({ "chat_id": chat_id, "open_ids": open_ids });
        self.post::<IgnoredAny>("/chat/v4/chatter/delete/", &body).await?;
        Ok(())
    }

    /// Disband a chat.
    pub async fn destroy_chat(&self, chat_id: &str) -> LarkResult<()> {
        let body = json!({ "chat_id": chat_id });
        self.post::<IgnoredAny>("/chat/v4/disband", &body).await?;
        Ok(())
    }

    /// Fetch chat details including members.
    pub async fn chat_info(&self, chat_id: &str) -> LarkResult<ChatInfo> {
        self.get("/chat/v4/info", &[("chat_id", chat_id)])
            .await?
            .into_data()
    }

    /// List every chat the bot is in, following pagination.
    pub async fn list_chats(&self) -> LarkResult<Vec<ChatSummary>> {
        let mut chats = Vec::new();
        let mut page_token = String::new();

        loop {
            let mut query = vec![("page_size", LIST_PAGE_SIZE)];
            if !page_token.is_empty() {
                query.push(("page_token", page_token.as_str()));
            }

            let page: ChatListData = self.get("/chat/v4/list", &query).await?.into_data()?;
            chats.extend(page.groups);

            if !page.has_more || page.page_token.is_empty() || page.page_token == page_token {
                break;
            }
            page_token = page.page_token;
        }

        Ok(chats)
    }

    /// Fetch profiles of the given users.
    pub async fn user_info(&self, open_ids: &[String]) -> LarkResult<Vec<UserInfo>> {
        if open_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query: Vec<(&str, &str)> = open_ids
            .iter()
            .map(|id| ("open_ids", id.as_str()))
            .collect();
        let data: UserInfoData = self
            .get("/contact/v1/user/batch_get", &query)
            .await?
            .into_data()?;
        Ok(data.user_infos)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base(), path)
    }

    async fn bearer(&self) -> LarkResult<String> {
        self.access_token
            .read()
            .await
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
            .ok_or_else(|| LarkError::Auth("no tenant access token yet".to_string()))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> LarkResult<Envelope<T>> {
        debug!("-> POST {} {}", path, body);
        let request = self.client.post(self.url(path)).json(body);
        self.execute(path, request).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> LarkResult<Envelope<T>> {
        debug!("-> GET {} {:?}", path, query);
        let request = self.client.get(self.url(path)).query(query);
        self.execute(path, request).await
    }

    /// Authorize, send and decode one request.
    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> LarkResult<Envelope<T>> {
        let response = request
            .header("Authorization", self.bearer().await?)
            .send()
            .await?;
        let text = Self::read_body(path, response).await?;

        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        if envelope.code != 0 {
            return Err(LarkApiError::new(envelope.code, envelope.msg).into());
        }

        Ok(envelope)
    }

    /// Read a response body, mapping HTTP failures.
    async fn read_body(path: &str, response: reqwest::Response) -> LarkResult<String> {
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            return Err(LarkError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let text = response.text().await?;
        debug!("<- {} {} {}", status.as_u16(), path, text);

        if status.is_success() {
            return Ok(text);
        }

        // The platform often explains a failure in a regular envelope.
        if let Ok(envelope) = serde_json::from_str::<Envelope<IgnoredAny>>(&text)
            && envelope.code != 0
        {
            return Err(LarkApiError::new(envelope.code, envelope.msg).into());
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(LarkError::Auth(format!("{}: {}", status, text)))
            }
            _ => Err(LarkError::Api(format!("{}: {}", status, text))),
        }
    }
}

#[async_trait]
impl ChatApi for LarkApi {
    async fn create_chat(&self, name: &str, owner_open_id: &str) -> LarkResult<String> {
        LarkApi::create_chat(self, name, owner_open_id).await
    }

    async fn add_users_to_chat(&self, chat_id: &str, open_ids: &[String]) -> LarkResult<()> {
        LarkApi::add_users_to_chat(self, chat_id, open_ids).await
    }

    async fn remove_users_from_chat(
        &self,
        chat_id: &str,
        open_ids: &[String],
    ) -> LarkResult<()> {
        LarkApi::remove_users_from_chat(self, chat_id, open_ids).await
    }

    async fn destroy_chat(&self, chat_id: &str) -> LarkResult<()> {
        LarkApi::destroy_chat(self, chat_id).await
    }

    async fn chat_info(&self, chat_id: &str) -> LarkResult<ChatInfo> {
        LarkApi::chat_info(self, chat_id).await
    }

    async fn list_chats(&self) -> LarkResult<Vec<ChatSummary>> {
        LarkApi::list_chats(self).await
    }

    async fn user_info(&self, open_ids: &[String]) -> LarkResult<Vec<UserInfo>> {
        LarkApi::user_info(self, open_ids).await
    }
}
