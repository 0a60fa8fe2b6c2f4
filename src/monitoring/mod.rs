//! Outbound notifications
//!
//! The bot only ever talks to one chat. Messages are fire-and-forget: callers
//! log delivery errors and carry on.

pub mod telegram;

use async_trait::async_trait;
use serde::Serialize;

pub use telegram::TelegramNotifier;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Markdown,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
        }
    }
}

/// URL button shown under a message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub url: String,
}

impl InlineButton {
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    /// One inner vec per keyboard row
    pub buttons: Vec<Vec<InlineButton>>,
    pub parse_mode: Option<ParseMode>,
}

impl OutboundMessage {
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            buttons: Vec::new(),
            parse_mode: None,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError>;
}
