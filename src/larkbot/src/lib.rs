//! Lark (Feishu) integration for larkbot.
//!
//! This crate provides:
//! - An API client for the Lark open platform (tenant token, messages,
//!   chat administration, user lookup)
//! - Decoding of event subscription payloads
//! - Rich-text post types
//! - The chat commands users can send to the bot
//!
//! # Architecture
//!
//! Incoming text messages are decoded with [`events::parse_event`] and the
//! command text is handed to [`calls::respond`], which dispatches it to the
//! command object matching the sender's role. The reply goes back through
//! [`LarkApi::send_message`].
//!
//! # Configuration
//!
//! Required environment variables:
//! - `LARK_APP_ID` - Application id
//! - `LARK_APP_SECRET` - Application secret
//!
//! Optional:
//! - `LARK_MASTERS` - Comma-separated open ids allowed to administer chats
//! - `LARK_API_BASE` - Open platform endpoint

pub mod api;
pub mod calls;
pub mod config;
pub mod error;
pub mod events;
pub mod messages;

// Re-export main types
pub use api::{ChatApi, LarkApi};
pub use calls::{Call, CallContext, MastersCall, respond};
pub use config::LarkConfig;
pub use error::{LarkError, LarkResult};
pub use events::{EventEnvelope, EventKind, MessageEvent, parse_event};
pub use messages::{Post, PostBuilder};
