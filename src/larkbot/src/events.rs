//! Event subscription payloads.
//!
//! Lark posts two kinds of envelopes to the event endpoint:
//! - `url_verification`, sent once when the endpoint is configured; the
//!   challenge must be echoed back
//! - `event_callback`, wrapping the actual event (`message`, ...)

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LarkError, LarkResult};

/// Envelope type of an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Endpoint verification; echo the challenge.
    UrlVerification,
    /// A subscribed event.
    EventCallback,
    /// Anything else (for forward compatibility).
    Unknown(String),
}

/// Outer request body of the event subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// `url_verification` or `event_callback`.
    #[serde(rename = "type", default)]
    pub envelope_type: String,
    /// Verification challenge.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub challenge: String,
    /// Verification token configured for the app.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Delivery id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    /// The wrapped event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<MessageEvent>,
}

impl EventEnvelope {
    /// Classify the envelope.
    pub fn kind(&self) -> EventKind {
        match self.envelope_type.as_str() {
            "url_verification" => EventKind::UrlVerification,
            "event_callback" => EventKind::EventCallback,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    /// The wrapped event, when it is a text message.
    pub fn text_message(&self) -> Option<&MessageEvent> {
        self.event.as_ref().filter(|event| event.is_text_message())
    }
}

/// Event payload for messages.
///
/// Every field defaults so that other event types decode too; use
/// [`MessageEvent::is_text_message`] before acting on one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Event type (`message`, ...).
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// Message type (`text`, `post`, `image`, ...).
    #[serde(default)]
    pub msg_type: String,
    /// `private` or `group`.
    #[serde(default)]
    pub chat_type: String,
    /// Chat the message was posted in.
    #[serde(default)]
    pub open_chat_id: String,
    /// Chat id, as sent by older event versions.
    #[serde(default)]
    pub chat_id: String,
    /// Sender's open id.
    #[serde(default)]
    pub open_id: String,
    /// Sender's open id, as sent by older event versions.
    #[serde(default)]
    pub user_open_id: String,
    /// Message id.
    #[serde(default)]
    pub open_message_id: String,
    /// Raw text, including mention markup.
    #[serde(default)]
    pub text: String,
    /// Text with the bot mention removed.
    #[serde(default)]
    pub text_without_at_bot: String,
    /// Whether the bot was mentioned.
    #[serde(default)]
    pub is_mention: bool,
}

impl MessageEvent {
    /// Check if this is a plain text message.
    pub fn is_text_message(&self) -> bool {
        self.event_type == "message" && self.msg_type == "text"
    }

    /// The command the sender typed.
    ///
    /// Prefers the text without the bot mention and falls back to the raw
    /// text; any remaining mention markup is removed.
    pub fn command_text(&self) -> String {
        let text = self.text_without_at_bot.trim();
        let text = if text.is_empty() {
            self.text.trim()
        } else {
            text
        };
        strip_mentions(text)
    }

    /// Chat to reply to.
    pub fn reply_chat_id(&self) -> &str {
        if self.open_chat_id.is_empty() {
            &self.chat_id
        } else {
            &self.open_chat_id
        }
    }

    /// Open id of the sender.
    pub fn sender(&self) -> &str {
        if self.open_id.is_empty() {
            &self.user_open_id
        } else {
            &self.open_id
        }
    }
}

/// Decode an event subscription request body.
pub fn parse_event(body: &[u8]) -> LarkResult<EventEnvelope> {
    let envelope: EventEnvelope = serde_json::from_slice(body)
        .map_err(|e| LarkError::InvalidPayload(format!("event body: {}", e)))?;
    debug!("Received {:?} envelope", envelope.kind());
    Ok(envelope)
}

/// Remove mention markup and trim.
///
/// Handles both `<at open_id="...">@name</at>` and `@_user_N` forms.
///
/// # Example
///
/// ```rust
/// use larkbot::events::strip_mentions;
///
/// assert_eq!(strip_mentions("@_user_1 list()"), "list()");
/// assert_eq!(strip_mentions(r#"<at open_id="ou_1">@bot</at> help"#), "help");
/// ```
pub fn strip_mentions(text: &str) -> String {
    let mut result = text.to_string();

    while let Some(start) = result.find("<at") {
        let Some(end) = result[start..].find("</at>") else {
            break;
        };
        result.replace_range(start..start + end + "</at>".len(), "");
    }

    let words: Vec<&str> = result
        .split(' ')
        .filter(|word| !is_mention_placeholder(word))
        .collect();

    words.join(" ").trim().to_string()
}

fn is_mention_placeholder(word: &str) -> bool {
    word.strip_prefix("@_user_")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
