use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::config::{Config, VenueConfig};
use crate::constants::{NOBITEX, RAMZINEX, TABDEAL};
use crate::types::{Quote, QuoteError};

use super::nobitex::NobitexClient;
use super::ramzinex::RamzinexClient;
use super::tabdeal::TabdealClient;

/// Reasons a single quote request can fail
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("order book has no {0} levels")]
    EmptyBook(&'static str),

    #[error("invalid quote: {0}")]
    InvalidQuote(#[from] QuoteError),
}

/// A venue that gave up after every attempt of one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub venue: String,
    pub attempts: u32,
    pub last_error: String,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unavailable after {} attempts: {}",
            self.venue, self.attempts, self.last_error
        )
    }
}

/// One venue's best bid/ask feed for the traded pair
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Venue name, also the wallet key
    fn venue(&self) -> &str;

    /// Issue exactly one request and normalize the answer
    async fn fetch_quote(&self) -> Result<Quote, FetchError>;
}

/// Shared request plumbing for the venue clients
#[derive(Debug, Clone)]
pub struct VenueHttp {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl VenueHttp {
    pub fn new(client: Client, base_url: &str, authorization: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            let value = HeaderValue::from_str(&value)
                .map_err(|_| anyhow!("credential contains characters not allowed in a header"))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).headers(self.headers.clone()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Read a price that a venue may encode either as a JSON string or a number
pub fn decimal_field(value: &Value, what: &str) -> Result<Decimal, FetchError> {
    match value {
        Value::String(text) => text
            .trim()
            .parse::<Decimal>()
            .map_err(|_| FetchError::Malformed(format!("{} is not a number: {:?}", what, text))),
        Value::Number(number) => number
            .to_string()
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .map_err(|_| FetchError::Malformed(format!("{} is out of range: {}", what, number))),
        Value::Null => Err(FetchError::Malformed(format!("{} is missing", what))),
        other => Err(FetchError::Malformed(format!("{} has unexpected type: {}", what, other))),
    }
}

/// Best level of one order-book side
pub fn first_level<'a>(levels: &'a Value, side: &'static str) -> Result<&'a Value, FetchError> {
    let levels = levels
        .as_array()
        .ok_or_else(|| FetchError::Malformed(format!("{} levels missing", side)))?;
    levels.first().ok_or(FetchError::EmptyBook(side))
}

/// Builds the HTTP client and the configured venue sources
pub struct ExchangeClientFactory;

impl ExchangeClientFactory {
    pub fn http_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))
    }

    pub fn create_source(
        venue: &VenueConfig,
        symbol: &str,
        client: Client,
    ) -> Result<Arc<dyn QuoteSource>> {
        let source: Arc<dyn QuoteSource> = match venue.name.as_str() {
            NOBITEX => Arc::new(NobitexClient::new(venue, symbol, client)?),
            RAMZINEX => Arc::new(RamzinexClient::new(venue, client)?),
            TABDEAL => Arc::new(TabdealClient::new(venue, symbol, client)?),
            other => return Err(anyhow!("Unsupported venue: {}", other)),
        };
        Ok(source)
    }

    /// Sources in configuration order; that order breaks price ties
    pub fn create_sources(config: &Config) -> Result<Vec<Arc<dyn QuoteSource>>> {
        let client = Self::http_client(config.fetch_timeout())?;

        config
            .get_enabled_venues()
            .into_iter()
            .map(|venue| Self::create_source(venue, &config.trading.symbol, client.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_field_accepts_strings_and_numbers() {
        assert_eq!(decimal_field(&json!("1050000"), "price").unwrap(), dec!(1050000));
        assert_eq!(decimal_field(&json!(" 1049900.5 "), "price").unwrap(), dec!(1049900.5));
        assert_eq!(decimal_field(&json!(1050000), "price").unwrap(), dec!(1050000));
        assert_eq!(decimal_field(&json!(1050000.25), "price").unwrap(), dec!(1050000.25));
    }

    #[test]
    fn test_decimal_field_rejects_garbage() {
        assert!(matches!(decimal_field(&json!("abc"), "price"), Err(FetchError::Malformed(_))));
        assert!(matches!(decimal_field(&json!(null), "price"), Err(FetchError::Malformed(_))));
        assert!(matches!(decimal_field(&json!([1]), "price"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_first_level() {
        let book = json!({"bids": [["100", "1"], ["99", "2"]], "asks": []});
        assert_eq!(first_level(&book["bids"], "bid").unwrap(), &json!(["100", "1"]));
        assert!(matches!(first_level(&book["asks"], "ask"), Err(FetchError::EmptyBook("ask"))));
        assert!(matches!(first_level(&book["missing"], "ask"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_factory_builds_sources_in_config_order() {
        let config = Config::load_test_config();
        let sources = ExchangeClientFactory::create_sources(&config).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.venue()).collect();
        assert_eq!(names, vec!["nobitex", "ramzinex", "tabdeal"]);
    }

    #[test]
    fn test_factory_skips_disabled_and_rejects_unknown() {
        let mut config = Config::load_test_config();
        config.venues[1].enabled = false;
        let sources = ExchangeClientFactory::create_sources(&config).unwrap();
        assert_eq!(sources.len(), 2);

        config.venues[0].name = "binance".to_string();
        assert!(ExchangeClientFactory::create_sources(&config).is_err());
    }

    #[test]
    fn test_failure_display() {
        let failure = FetchFailure {
            venue: "tabdeal".to_string(),
            attempts: 3,
            last_error: "unexpected HTTP status 502".to_string(),
        };
        assert_eq!(failure.to_string(), "tabdeal unavailable after 3 attempts: unexpected HTTP status 502");
    }
}
