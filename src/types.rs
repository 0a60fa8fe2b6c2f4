use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Simulated USDT balance per venue. Ordered so the wallet file is stable.
pub type WalletSet = BTreeMap<String, Decimal>;

/// Rejection reasons for a normalized quote
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("{venue}: buy price must be positive, got {price}")]
    NonPositiveBuyPrice { venue: String, price: Decimal },

    #[error("{venue}: sell price must be positive, got {price}")]
    NonPositiveSellPrice { venue: String, price: Decimal },

    #[error("{venue}: fee rate must be in [0, 1), got {fee_rate}")]
    FeeRateOutOfRange { venue: String, fee_rate: Decimal },
}

/// A venue's best buy/sell prices for the traded pair, normalized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub venue: String,
    /// Price paid when buying USDT on this venue
    pub buy_price: Decimal,
    /// Price received when selling USDT on this venue
    pub sell_price: Decimal,
    pub fee_rate: Decimal,
    /// Market page linked from signal buttons
    pub reference_url: String,
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(
        venue: impl Into<String>,
        buy_price: Decimal,
        sell_price: Decimal,
        fee_rate: Decimal,
        reference_url: impl Into<String>,
    ) -> Result<Self, QuoteError> {
        let venue = venue.into();

        if buy_price <= Decimal::ZERO {
            return Err(QuoteError::NonPositiveBuyPrice { venue, price: buy_price });
        }
        if sell_price <= Decimal::ZERO {
            return Err(QuoteError::NonPositiveSellPrice { venue, price: sell_price });
        }
        if fee_rate < Decimal::ZERO || fee_rate >= Decimal::ONE {
            return Err(QuoteError::FeeRateOutOfRange { venue, fee_rate });
        }

        Ok(Self {
            venue,
            buy_price,
            sell_price,
            fee_rate,
            reference_url: reference_url.into(),
            fetched_at: Utc::now(),
        })
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buy={} sell={} fee={}",
            self.venue, self.buy_price, self.sell_price, self.fee_rate
        )
    }
}

/// Best-buy/best-sell pairing derived from one cycle's quotes
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrageOpportunity {
    pub buy_venue: Quote,
    pub sell_venue: Quote,
    pub capital: Decimal,
    /// USDT bought with the full capital on the buy venue
    pub trade_amount: Decimal,
    /// Proceeds of selling `trade_amount` before the sell fee
    pub gross_sell: Decimal,
    pub net_profit: Decimal,
    pub profit_percent: Decimal,
}

impl ArbitrageOpportunity {
    /// Both legs landed on the same venue
    pub fn is_same_venue(&self) -> bool {
        self.buy_venue.venue == self.sell_venue.venue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_accepts_valid_values() {
        let quote = Quote::new("nobitex", dec!(1000), dec!(1010), dec!(0.002), "https://nobitex.ir").unwrap();
        assert_eq!(quote.venue, "nobitex");
        assert_eq!(quote.buy_price, dec!(1000));
        assert_eq!(quote.sell_price, dec!(1010));
        assert_eq!(quote.to_string(), "nobitex buy=1000 sell=1010 fee=0.002");
    }

    #[test]
    fn test_quote_rejects_out_of_range_values() {
        assert!(matches!(
            Quote::new("a", dec!(0), dec!(1), dec!(0), ""),
            Err(QuoteError::NonPositiveBuyPrice { .. })
        ));
        assert!(matches!(
            Quote::new("a", dec!(1), dec!(-5), dec!(0), ""),
            Err(QuoteError::NonPositiveSellPrice { .. })
        ));
        assert!(matches!(
            Quote::new("a", dec!(1), dec!(1), dec!(1), ""),
            Err(QuoteError::FeeRateOutOfRange { .. })
        ));
        assert!(matches!(
            Quote::new("a", dec!(1), dec!(1), dec!(-0.001), ""),
            Err(QuoteError::FeeRateOutOfRange { .. })
        ));
        // zero fee is allowed
        assert!(Quote::new("a", dec!(1), dec!(1), dec!(0), "").is_ok());
    }
}
