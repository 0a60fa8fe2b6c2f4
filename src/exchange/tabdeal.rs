use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::VenueConfig;
use crate::types::Quote;

use super::client::{decimal_field, first_level, FetchError, QuoteSource, VenueHttp};

/// Tabdeal order-book endpoint; levels are `[price, quantity]` pairs
#[derive(Debug)]
pub struct TabdealClient {
    venue: String,
    http: VenueHttp,
    symbol: String,
    fee_rate: Decimal,
    reference_url: String,
}

impl TabdealClient {
    pub fn new(venue: &VenueConfig, symbol: &str, client: Client) -> Result<Self> {
        let authorization = venue.api_key.as_ref().map(|key| format!("Bearer {}", key));

        Ok(Self {
            venue: venue.name.clone(),
            http: VenueHttp::new(client, &venue.api_url, authorization)?,
            symbol: symbol.to_uppercase(),
            fee_rate: venue.fee_rate,
            reference_url: venue.reference_url.clone(),
        })
    }

    pub fn orderbook_path(&self) -> String {
        format!("/v1/market/orderbook?symbol={}", self.symbol)
    }
}

/// Extract the top bid and ask prices
pub fn parse_orderbook(payload: &Value) -> Result<(Decimal, Decimal), FetchError> {
    let data = payload
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| FetchError::Malformed("data missing".to_string()))?;

    let bid = first_level(&data["bids"], "bid")?;
    let ask = first_level(&data["asks"], "ask")?;

    Ok((
        decimal_field(&bid[0], "bids[0][0]")?,
        decimal_field(&ask[0], "asks[0][0]")?,
    ))
}

#[async_trait]
impl QuoteSource for TabdealClient {
    fn venue(&self) -> &str {
        &self.venue
    }

    async fn fetch_quote(&self) -> Result<Quote, FetchError> {
        let payload = self.http.get_json(&self.orderbook_path()).await?;
        let (buy, sell) = parse_orderbook(&payload)?;
        Ok(Quote::new(&self.venue, buy, sell, self.fee_rate, &self.reference_url)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_orderbook() {
        let payload = json!({
            "data": {
                "bids": [["1049000", "120.5"], ["1048900", "3"]],
                "asks": [["1050500", "80"]]
            }
        });

        let (buy, sell) = parse_orderbook(&payload).unwrap();
        assert_eq!(buy, dec!(1049000));
        assert_eq!(sell, dec!(1050500));
    }

    #[test]
    fn test_parse_orderbook_empty_bids() {
        let payload = json!({"data": {"bids": [], "asks": [["1050500", "80"]]}});
        assert!(matches!(parse_orderbook(&payload), Err(FetchError::EmptyBook("bid"))));
    }

    #[test]
    fn test_parse_orderbook_bad_level() {
        let payload = json!({"data": {"bids": [[]], "asks": [["1050500", "80"]]}});
        assert!(matches!(parse_orderbook(&payload), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_request_shape() {
        let config = Config::load_test_config();
        let venue = config.get_venue("tabdeal").unwrap();
        let client = TabdealClient::new(venue, "usdtirt", Client::new()).unwrap();

        assert_eq!(client.venue(), "tabdeal");
        assert_eq!(
            client.http.url(&client.orderbook_path()),
            "https://api.tabdeal.org/v1/market/orderbook?symbol=USDTIRT"
        );
    }
}
