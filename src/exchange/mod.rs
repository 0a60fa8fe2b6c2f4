pub mod client;
pub mod retry;
pub mod aggregator;
pub mod nobitex;
pub mod ramzinex;
pub mod tabdeal;

pub use client::{ExchangeClientFactory, FetchError, FetchFailure, QuoteSource};
pub use retry::RetryPolicy;
pub use aggregator::{Collection, QuoteAggregator};
pub use nobitex::NobitexClient;
pub use ramzinex::RamzinexClient;
pub use tabdeal::TabdealClient;
