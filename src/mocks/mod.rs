pub mod exchange_clients;
pub mod notifier;
pub mod wallet_store;

pub use exchange_clients::{MockQuoteSource, RecordingSleeper};
pub use notifier::{LogNotifier, RecordingNotifier};
pub use wallet_store::MemoryWalletStore;

use std::env;

/// Check if mock mode is enabled
pub fn is_mock_mode() -> bool {
    env::var("API_MODE").unwrap_or_default() == "mock"
}

/// Get mock configuration values
pub fn get_mock_config() -> MockConfig {
    MockConfig {
        mid_price: env::var("MOCK_MID_PRICE")
            .unwrap_or_else(|_| "35000".to_string())
            .parse()
            .unwrap_or(35_000),
        price_jitter_bps: env::var("MOCK_PRICE_JITTER_BPS")
            .unwrap_or_else(|_| "250".to_string())
            .parse()
            .unwrap_or(250),
        spread_bps: env::var("MOCK_SPREAD_BPS")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .unwrap_or(20),
        failure_rate: env::var("MOCK_FAILURE_RATE")
            .unwrap_or_else(|_| "0.05".to_string())
            .parse()
            .unwrap_or(0.05),
        exchange_latency_ms: env::var("MOCK_EXCHANGE_LATENCY_MS")
            .unwrap_or_else(|_| "25".to_string())
            .parse()
            .unwrap_or(25),
    }
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Center of the simulated USDT price in tomans, low enough that the
    /// default capital buys more than the minimum trade size
    pub mid_price: i64,
    /// Max per-request deviation from `mid_price`, in basis points
    pub price_jitter_bps: i64,
    /// Gap between a venue's buy and sell side, in basis points
    pub spread_bps: i64,
    /// Probability that a simulated request fails
    pub failure_rate: f64,
    pub exchange_latency_ms: u64,
}
