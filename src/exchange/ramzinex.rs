use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::VenueConfig;
use crate::constants::RAMZINEX_USDT_PAIR_ID;
use crate::types::Quote;

use super::client::{decimal_field, first_level, FetchError, QuoteSource, VenueHttp};

/// Ramzinex public order-book endpoint
#[derive(Debug)]
pub struct RamzinexClient {
    venue: String,
    http: VenueHttp,
    pair_id: u32,
    fee_rate: Decimal,
    reference_url: String,
}

impl RamzinexClient {
    pub fn new(venue: &VenueConfig, client: Client) -> Result<Self> {
        // Ramzinex expects the raw key, no scheme prefix
        let authorization = venue.api_key.clone();

        Ok(Self {
            venue: venue.name.clone(),
            http: VenueHttp::new(client, &venue.api_url, authorization)?,
            pair_id: RAMZINEX_USDT_PAIR_ID,
            fee_rate: venue.fee_rate,
            reference_url: venue.reference_url.clone(),
        })
    }

    pub fn orderbook_path(&self) -> String {
        format!("/exchange/api/v1.0/exchange/orderbooks/{}", self.pair_id)
    }
}

/// Extract the top `buy` and `sell` level prices from an order-book payload
pub fn parse_orderbook(payload: &Value) -> Result<(Decimal, Decimal), FetchError> {
    let data = payload
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| FetchError::Malformed("data missing".to_string()))?;

    let buy = first_level(&data["buy"], "buy")?;
    let sell = first_level(&data["sell"], "sell")?;

    Ok((
        decimal_field(&buy["price"], "buy[0].price")?,
        decimal_field(&sell["price"], "sell[0].price")?,
    ))
}

#[async_trait]
impl QuoteSource for RamzinexClient {
    fn venue(&self) -> &str {
        &self.venue
    }

    async fn fetch_quote(&self) -> Result<Quote, FetchError> {
        let payload = self.http.get_json(&self.orderbook_path()).await?;
        let (buy, sell) = parse_orderbook(&payload)?;
        Ok(Quote::new(&self.venue, buy, sell, self.fee_rate, &self.reference_url)?)
    }
}
