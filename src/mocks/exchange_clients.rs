use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::common::Sleeper;
use crate::config::VenueConfig;
use crate::exchange::{FetchError, QuoteSource};
use crate::types::Quote;

use super::MockConfig;

#[derive(Debug, Clone)]
enum MockPrices {
    Fixed { buy: Decimal, sell: Decimal },
    Simulated(MockConfig),
    Unavailable,
    Panicking,
}

/// In-process venue used by tests and by `--mock` runs
///
/// `fixed` always answers the same prices, `simulated` draws fresh prices
/// around a mid price on every request.
#[derive(Debug)]
pub struct MockQuoteSource {
    venue: String,
    prices: MockPrices,
    fee_rate: Decimal,
    reference_url: String,
    failures_remaining: AtomicU32,
    calls: AtomicU32,
}

impl MockQuoteSource {
    fn build(venue: &str, prices: MockPrices, fee_rate: Decimal) -> Self {
        Self {
            venue: venue.to_string(),
            prices,
            fee_rate,
            reference_url: format!("https://{}.example/market/usdt", venue),
            failures_remaining: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn fixed(venue: &str, buy: Decimal, sell: Decimal, fee_rate: Decimal) -> Self {
        Self::build(venue, MockPrices::Fixed { buy, sell }, fee_rate)
    }

    /// Every request fails with HTTP 503
    pub fn unavailable(venue: &str) -> Self {
        Self::build(venue, MockPrices::Unavailable, Decimal::ZERO)
    }

    /// Every request panics, for exercising the scheduler fault boundary
    pub fn panicking(venue: &str) -> Self {
        Self::build(venue, MockPrices::Panicking, Decimal::ZERO)
    }

    pub fn simulated(venue: &VenueConfig, mock: &MockConfig) -> Self {
        let mut source = Self::build(&venue.name, MockPrices::Simulated(mock.clone()), venue.fee_rate);
        source.reference_url = venue.reference_url.clone();
        source
    }

    /// Fail the first `count` requests before answering normally
    pub fn failing_first(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }

    fn simulate(config: &MockConfig) -> Result<(Decimal, Decimal), FetchError> {
        if fastrand::f64() < config.failure_rate {
            return Err(FetchError::Status { status: 503 });
        }

        let jitter = config.price_jitter_bps.max(0);
        let offset = Decimal::new(fastrand::i64(-jitter..=jitter), 4);
        let spread = Decimal::new(config.spread_bps.max(0), 4);

        let mid = Decimal::from(config.mid_price);
        let buy = (mid * (Decimal::ONE + offset)).round();
        let sell = (buy * (Decimal::ONE - spread)).round();
        Ok((buy, sell))
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    fn venue(&self) -> &str {
        &self.venue
    }

    async fn fetch_quote(&self) -> Result<Quote, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.take_failure() {
            return Err(FetchError::Status { status: 503 });
        }

        let (buy, sell) = match &self.prices {
            MockPrices::Fixed { buy, sell } => (*buy, *sell),
            MockPrices::Unavailable => return Err(FetchError::Status { status: 503 }),
            MockPrices::Panicking => panic!("mock venue {} blew up", self.venue),
            MockPrices::Simulated(config) => {
                tokio::time::sleep(Duration::from_millis(config.exchange_latency_ms)).await;
                Self::simulate(config)?
            }
        };

        debug!("🎭 mock {} quote buy={} sell={}", self.venue, buy, sell);
        Ok(Quote::new(&self.venue, buy, sell, self.fee_rate, &self.reference_url)?)
    }
}

/// Sleeper that records requested pauses and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn total(&self) -> Duration {
        self.sleeps().into_iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).push(duration);
    }
}
