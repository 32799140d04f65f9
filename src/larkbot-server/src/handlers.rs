//! Request handlers for the event subscription and utility routes.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use larkbot::{CallContext, ChatApi, EventKind, MessageEvent, parse_event, respond};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::state::AppState;

/// Event subscription endpoint.
///
/// Answers the verification challenge and hands text messages to a
/// background task; everything else is acknowledged with `204`.
pub async fn handle_events(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let envelope = match parse_event(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Ignoring event request: {}", e);
            return StatusCode::NO_CONTENT.into_response();
        }
    };
    debug!("{}", String::from_utf8_lossy(&body));

    match envelope.kind() {
        EventKind::UrlVerification => {
            info!("Answering URL verification");
            Json(json!({ "challenge": envelope.challenge })).into_response()
        }
        EventKind::EventCallback => {
            if let Some(message) = envelope.text_message() {
                tokio::spawn(reply_to_message(state, message.clone()));
            }
            StatusCode::NO_CONTENT.into_response()
        }
        EventKind::Unknown(kind) => {
            debug!("Ignoring {:?} envelope", kind);
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// Run the command in `message` and post the reply to its chat.
pub async fn reply_to_message(state: Arc<AppState>, message: MessageEvent) {
    let text = message.command_text();
    let chat_id = message.reply_chat_id().to_string();
    let context = CallContext::new(message.sender(), chat_id.as_str());
    info!("Command from {} in {}: {}", context.sender, chat_id, text);

    let api: Arc<dyn ChatApi> = state.api.clone();
    let reply = respond(api, &state.config.lark, context, &text).await;

    if let Err(e) = state.api.send_message(&chat_id, &reply).await {
        error!("Failed to reply in chat {}: {}", chat_id, e);
    }
}

/// Always `204 No Content`.
pub async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Fallback for unknown routes and methods.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
