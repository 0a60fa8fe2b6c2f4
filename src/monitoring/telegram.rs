use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TelegramConfig;

use super::{InlineButton, Notifier, NotifyError, OutboundMessage};

/// Telegram Bot API `sendMessage` client
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: &'a [Vec<InlineButton>],
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create Telegram HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }

    fn request(message: &OutboundMessage) -> SendMessageRequest<'_> {
        SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: message.parse_mode.map(|mode| mode.as_str()),
            reply_markup: (!message.buttons.is_empty()).then(|| InlineKeyboardMarkup {
                inline_keyboard: &message.buttons,
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&Self::request(message))
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse = response.json().await.unwrap_or(ApiResponse {
            ok: false,
            description: None,
        });

        if !status.is_success() || !body.ok {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: body.description.unwrap_or_else(|| "no description".to_string()),
            });
        }

        debug!("📨 Telegram message delivered to {}", message.chat_id);
        Ok(())
    }
}
