use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::monitoring::{Notifier, NotifyError, OutboundMessage};

/// Captures outgoing messages instead of delivering them
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<OutboundMessage>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every message, as an unreachable chat would
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Successfully delivered messages, oldest first
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(NotifyError::Rejected {
                status: 400,
                description: "Bad Request: chat not found".to_string(),
            });
        }

        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }
}

/// Writes messages to the log, used for offline runs
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        info!("🎭 [mock notify → {}]\n{}", message.chat_id, message.text);
        for row in &message.buttons {
            for button in row {
                info!("🎭   [{}]({})", button.text, button.url);
            }
        }
        Ok(())
    }
}
