use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::VenueConfig;
use crate::types::Quote;

use super::client::{decimal_field, FetchError, QuoteSource, VenueHttp};

/// Nobitex market statistics endpoint
#[derive(Debug)]
pub struct NobitexClient {
    venue: String,
    http: VenueHttp,
    /// Nobitex keys its stats by the lowercase symbol
    market: String,
    fee_rate: Decimal,
    reference_url: String,
}

impl NobitexClient {
    pub fn new(venue: &VenueConfig, symbol: &str, client: Client) -> Result<Self> {
        let authorization = venue.api_key.as_ref().map(|token| format!("Token {}", token));

        Ok(Self {
            venue: venue.name.clone(),
            http: VenueHttp::new(client, &venue.api_url, authorization)?,
            market: symbol.to_lowercase(),
            fee_rate: venue.fee_rate,
            reference_url: venue.reference_url.clone(),
        })
    }

    pub fn stats_path(&self) -> String {
        format!("/market/stats/?symbol={}", self.market)
    }
}

/// Extract `(bestBuy, bestSell)` for `market` from a stats payload
pub fn parse_stats(payload: &Value, market: &str) -> Result<(Decimal, Decimal), FetchError> {
    let stats = payload
        .get("stats")
        .and_then(|stats| stats.get(market))
        .filter(|entry| entry.is_object())
        .ok_or_else(|| FetchError::Malformed(format!("stats.{} missing", market)))?;

    let buy = decimal_field(&stats["bestBuy"], "bestBuy")?;
    let sell = decimal_field(&stats["bestSell"], "bestSell")?;
    Ok((buy, sell))
}

#[async_trait]
impl QuoteSource for NobitexClient {
    fn venue(&self) -> &str {
        &self.venue
    }

    async fn fetch_quote(&self) -> Result<Quote, FetchError> {
        let payload = self.http.get_json(&self.stats_path()).await?;
        let (buy, sell) = parse_stats(&payload, &self.market)?;
        Ok(Quote::new(&self.venue, buy, sell, self.fee_rate, &self.reference_url)?)
    }
}
