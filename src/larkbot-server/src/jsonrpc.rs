//! JSON-RPC 1.0 endpoint for pushing messages into chats.
//!
//! Requests look like `{"method": "Lark.SendMessage", "params": [{...}], "id": 1}`
//! and are answered with `{"id": 1, "result": true, "error": null}`, or with
//! `result` null and `error` set to a message on failure.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use larkbot::{LarkApi, LarkError, Post};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::state::AppState;

/// Incoming call.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    /// `Service.Method`.
    pub method: String,
    /// Positional parameters; only the first is used.
    #[serde(default)]
    pub params: Value,
    /// Echoed back in the response.
    #[serde(default)]
    pub id: Value,
}

/// Outgoing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: Value,
    pub result: Value,
    pub error: Value,
}

impl RpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            id,
            result,
            error: Value::Null,
        }
    }

    fn err(id: Value, error: &RpcError) -> Self {
        Self {
            id,
            result: Value::Null,
            error: Value::String(error.to_string()),
        }
    }
}

/// Failures reported in the `error` member.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc: can't find method {0}")]
    UnknownMethod(String),

    #[error("rpc: service/method request ill-formed: {0}")]
    IllFormed(String),

    #[error("please specify chat id")]
    MissingChatId,

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Lark(#[from] LarkError),
}

/// Parameters of `Lark.SendMessage`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageArgs {
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub content: String,
}

/// Parameters of `Lark.SendPost`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendPostArgs {
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub post: Post,
}

/// Decode the first positional parameter, also accepting a bare object.
fn decode_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    let first = match params {
        Value::Array(mut values) if !values.is_empty() => values.swap_remove(0),
        Value::Object(_) => params,
        other => return Err(RpcError::InvalidParams(other.to_string())),
    };
    serde_json::from_value(first).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

/// Run one request against the API.
pub async fn dispatch(api: &LarkApi, request: RpcRequest) -> Result<Value, RpcError> {
    let Some((service, method)) = request.method.split_once('.') else {
        return Err(RpcError::IllFormed(request.method));
    };
    if service != "Lark" {
        return Err(RpcError::UnknownMethod(request.method));
    }

    match method {
        "SendMessage" => {
            let args: SendMessageArgs = decode_params(request.params)?;
            if args.chat_id.is_empty() {
                return Err(RpcError::MissingChatId);
            }
            api.send_message(&args.chat_id, &args.content).await?;
            Ok(Value::Bool(true))
        }
        "SendPost" => {
            let args: SendPostArgs = decode_params(request.params)?;
            if args.chat_id.is_empty() {
                return Err(RpcError::MissingChatId);
            }
            api.send_post(&args.chat_id, &args.post).await?;
            Ok(Value::Bool(true))
        }
        _ => Err(RpcError::UnknownMethod(request.method)),
    }
}

/// JSON-RPC endpoint. A body that is not a request at all gets `400`.
pub async fn handle_jsonrpc(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("<- malformed request: {}", e);
            let error = RpcError::InvalidParams(e.to_string());
            return (
                StatusCode::BAD_REQUEST,
                Json(RpcResponse::err(Value::Null, &error)),
            )
                .into_response();
        }
    };
    debug!("-> {} - {}", request.method, request.params);

    let id = request.id.clone();
    let method = request.method.clone();
    let response = match dispatch(&state.api, request).await {
        Ok(result) => {
            debug!("<- {} - {}", method, result);
            RpcResponse::ok(id, result)
        }
        Err(e) => {
            debug!("<- {} - {}", method, e);
            RpcResponse::err(id, &e)
        }
    };

    Json(response).into_response()
}
