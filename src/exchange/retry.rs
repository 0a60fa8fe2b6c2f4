use std::time::Duration;

use tracing::{debug, warn};

use crate::common::Sleeper;
use crate::config::FetchConfig;
use crate::types::Quote;

use super::client::{FetchFailure, QuoteSource};

/// Bounded retry with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.backoff_secs))
    }

    /// Fetch one quote, retrying transient errors. Exhaustion is a value, not an error.
    pub async fn fetch(
        &self,
        source: &dyn QuoteSource,
        sleeper: &dyn Sleeper,
    ) -> Result<Quote, FetchFailure> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match source.fetch_quote().await {
                Ok(quote) => {
                    debug!("📈 {} quote on attempt {}: {}", source.venue(), attempt, quote);
                    return Ok(quote);
                }
                Err(e) => {
                    warn!(
                        "⚠️ {} fetch failed (attempt {}/{}): {}",
                        source.venue(),
                        attempt,
                        self.max_attempts,
                        e
                    );
                    last_error = e.to_string();

                    if attempt < self.max_attempts {
                        sleeper.sleep(self.backoff).await;
                    }
                }
            }
        }

        Err(FetchFailure {
            venue: source.venue().to_string(),
            attempts: self.max_attempts,
            last_error,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default().fetch)
    }
}
