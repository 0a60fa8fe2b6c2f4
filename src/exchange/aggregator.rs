use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::common::Sleeper;
use crate::monitoring::{Notifier, OutboundMessage};
use crate::types::Quote;

use super::client::QuoteSource;
use super::retry::RetryPolicy;

/// Result of polling every venue once
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Successful quotes in source registration order
    pub quotes: Vec<Quote>,
    pub failed_venues: Vec<String>,
}

/// Polls all venues and reports the ones that did not answer
pub struct QuoteAggregator {
    sources: Vec<Arc<dyn QuoteSource>>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    notifier: Arc<dyn Notifier>,
    chat_id: i64,
}

impl QuoteAggregator {
    pub fn new(
        sources: Vec<Arc<dyn QuoteSource>>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
        notifier: Arc<dyn Notifier>,
        chat_id: i64,
    ) -> Self {
        Self {
            sources,
            policy,
            sleeper,
            notifier,
            chat_id,
        }
    }

    pub fn venues(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.venue()).collect()
    }

    pub async fn collect(&self) -> Collection {
        // join_all keeps input order, so tie-breaking stays reproducible
        let results = join_all(
            self.sources
                .iter()
                .map(|source| self.policy.fetch(source.as_ref(), self.sleeper.as_ref())),
        )
        .await;

        let mut collection = Collection::default();
        for result in results {
            match result {
                Ok(quote) => collection.quotes.push(quote),
                Err(failure) => {
                    warn!("❌ {}", failure);
                    collection.failed_venues.push(failure.venue);
                }
            }
        }

        info!(
            "📊 Collected {}/{} quotes",
            collection.quotes.len(),
            self.sources.len()
        );

        if !collection.failed_venues.is_empty() {
            self.report_failures(&collection.failed_venues).await;
        }

        collection
    }

    async fn report_failures(&self, failed_venues: &[String]) {
        let message = OutboundMessage::plain(
            self.chat_id,
            format!("⚠️ Failed to fetch data from: {}", failed_venues.join(", ")),
        );

        if let Err(e) = self.notifier.send(&message).await {
            error!("❌ Failed to send venue failure alert: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockQuoteSource, RecordingNotifier, RecordingSleeper};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn aggregator(sources: Vec<Arc<dyn QuoteSource>>, notifier: Arc<RecordingNotifier>) -> QuoteAggregator {
        QuoteAggregator::new(
            sources,
            RetryPolicy::new(3, Duration::from_secs(2)),
            Arc::new(RecordingSleeper::new()),
            notifier,
            7,
        )
    }

    #[tokio::test]
    async fn test_all_venues_succeed() {
        let notifier = Arc::new(RecordingNotifier::new());
        let agg = aggregator(
            vec![
                Arc::new(MockQuoteSource::fixed("nobitex", dec!(1000), dec!(1005), dec!(0.002))),
                Arc::new(MockQuoteSource::fixed("ramzinex", dec!(1001), dec!(1006), dec!(0.0015))),
                Arc::new(MockQuoteSource::fixed("tabdeal", dec!(999), dec!(1004), dec!(0.002))),
            ],
            notifier.clone(),
        );

        let collection = agg.collect().await;

        let venues: Vec<&str> = collection.quotes.iter().map(|q| q.venue.as_str()).collect();
        assert_eq!(venues, vec!["nobitex", "ramzinex", "tabdeal"]);
        assert!(collection.failed_venues.is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_partitioned_and_reported_once() {
        let notifier = Arc::new(RecordingNotifier::new());
        let agg = aggregator(
            vec![
                Arc::new(MockQuoteSource::unavailable("nobitex")),
                Arc::new(MockQuoteSource::fixed("ramzinex", dec!(1001), dec!(1006), dec!(0.0015))),
                Arc::new(MockQuoteSource::unavailable("tabdeal")),
            ],
            notifier.clone(),
        );

        let collection = agg.collect().await;

        assert_eq!(collection.quotes.len(), 1);
        assert_eq!(collection.failed_venues, vec!["nobitex".to_string(), "tabdeal".to_string()]);

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].chat_id, 7);
        assert!(messages[0].text.contains("nobitex, tabdeal"));
        assert!(!messages[0].text.contains("ramzinex"));
        assert!(messages[0].buttons.is_empty());
    }

    #[tokio::test]
    async fn test_alert_delivery_failure_is_swallowed() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let agg = aggregator(
            vec![
                Arc::new(MockQuoteSource::unavailable("nobitex")),
                Arc::new(MockQuoteSource::unavailable("ramzinex")),
            ],
            notifier.clone(),
        );

        let collection = agg.collect().await;

        assert!(collection.quotes.is_empty());
        assert_eq!(collection.failed_venues.len(), 2);
        assert_eq!(notifier.attempts(), 1);
    }
}
