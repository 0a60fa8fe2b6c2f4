use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::constants::USDT_DECIMALS;
use crate::types::{ArbitrageOpportunity, Quote};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EvaluationError {
    #[error("need at least 2 quotes to evaluate, got {0}")]
    InsufficientQuotes(usize),

    #[error("arithmetic overflow while computing {0}")]
    Arithmetic(&'static str),
}

/// Picks the cheapest place to buy and the richest place to sell
#[derive(Debug, Clone)]
pub struct ArbitrageEvaluator {
    capital: Decimal,
}

impl ArbitrageEvaluator {
    pub fn new(capital: Decimal) -> Self {
        Self { capital }
    }

    /// Pair the minimum buy price with the maximum sell price.
    ///
    /// Ties go to the earliest quote. Both legs may land on the same venue.
    pub fn evaluate(&self, quotes: &[Quote]) -> Result<ArbitrageOpportunity, EvaluationError> {
        let (first, rest) = quotes
            .split_first()
            .filter(|_| quotes.len() >= 2)
            .ok_or(EvaluationError::InsufficientQuotes(quotes.len()))?;

        let mut buy = first;
        let mut sell = first;
        for quote in rest {
            if quote.buy_price < buy.buy_price {
                buy = quote;
            }
            if quote.sell_price > sell.sell_price {
                sell = quote;
            }
        }

        let opportunity = self.price(buy, sell)?;
        if opportunity.is_same_venue() {
            debug!("🔁 Best buy and best sell are both on {}", buy.venue);
        }

        debug!(
            "🧮 buy {} @ {} → sell {} @ {}: {} ({}%)",
            buy.venue, buy.buy_price, sell.venue, sell.sell_price, opportunity.net_profit, opportunity.profit_percent
        );

        Ok(opportunity)
    }

    fn price(&self, buy: &Quote, sell: &Quote) -> Result<ArbitrageOpportunity, EvaluationError> {
        let capital = self.capital;

        let trade_amount = capital
            .checked_div(buy.buy_price)
            .ok_or(EvaluationError::Arithmetic("trade amount"))?
            .round_dp_with_strategy(USDT_DECIMALS, RoundingStrategy::ToZero);
        let gross_sell = trade_amount
            .checked_mul(sell.sell_price)
            .ok_or(EvaluationError::Arithmetic("gross proceeds"))?;
        let proceeds = gross_sell
            .checked_mul(Decimal::ONE - sell.fee_rate)
            .ok_or(EvaluationError::Arithmetic("net proceeds"))?;
        let cost = capital
            .checked_mul(Decimal::ONE + buy.fee_rate)
            .ok_or(EvaluationError::Arithmetic("cost"))?;
        let net_profit = proceeds
            .checked_sub(cost)
            .ok_or(EvaluationError::Arithmetic("net profit"))?;
        let profit_percent = net_profit
            .checked_div(capital)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(EvaluationError::Arithmetic("profit percent"))?;

        Ok(ArbitrageOpportunity {
            buy_venue: buy.clone(),
            sell_venue: sell.clone(),
            capital,
            trade_amount,
            gross_sell,
            net_profit,
            profit_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(venue: &str, buy: Decimal, sell: Decimal, fee: Decimal) -> Quote {
        Quote::new(venue, buy, sell, fee, format!("https://{}.example", venue)).unwrap()
    }

    fn evaluator() -> ArbitrageEvaluator {
        ArbitrageEvaluator::new(dec!(4000000))
    }

    #[test]
    fn test_reference_scenario() {
        let quotes = vec![
            quote("nobitex", dec!(1000), dec!(990), dec!(0.002)),
            quote("ramzinex", dec!(1060), dec!(1050), dec!(0.0015)),
        ];

        let opp = evaluator().evaluate(&quotes).unwrap();

        assert_eq!(opp.buy_venue.venue, "nobitex");
        assert_eq!(opp.sell_venue.venue, "ramzinex");
        assert_eq!(opp.trade_amount, dec!(4000));
        assert_eq!(opp.gross_sell, dec!(4200000));
        assert_eq!(opp.net_profit, dec!(185700));
        assert_eq!(opp.profit_percent, dec!(4.6425));
        assert!(!opp.is_same_venue());
    }

    #[test]
    fn test_selects_min_buy_and_max_sell() {
        let quotes = vec![
            quote("nobitex", dec!(1010), dec!(1000), dec!(0.002)),
            quote("ramzinex", dec!(1005), dec!(1002), dec!(0.0015)),
            quote("tabdeal", dec!(1020), dec!(1015), dec!(0.002)),
        ];

        let opp = evaluator().evaluate(&quotes).unwrap();

        assert_eq!(opp.buy_venue.venue, "ramzinex");
        assert_eq!(opp.sell_venue.venue, "tabdeal");
        for q in &quotes {
            assert!(opp.buy_venue.buy_price <= q.buy_price);
            assert!(opp.sell_venue.sell_price >= q.sell_price);
        }
    }

    #[test]
    fn test_ties_go_to_first_quote() {
        let quotes = vec![
            quote("nobitex", dec!(1000), dec!(1000), dec!(0.002)),
            quote("ramzinex", dec!(1000), dec!(1000), dec!(0.0015)),
            quote("tabdeal", dec!(1000), dec!(1000), dec!(0.002)),
        ];

        let opp = evaluator().evaluate(&quotes).unwrap();
        assert_eq!(opp.buy_venue.venue, "nobitex");
        assert_eq!(opp.sell_venue.venue, "nobitex");
    }

    #[test]
    fn test_same_venue_is_allowed() {
        let quotes = vec![
            quote("nobitex", dec!(1000), dec!(1100), dec!(0)),
            quote("ramzinex", dec!(1050), dec!(1040), dec!(0)),
        ];

        let opp = evaluator().evaluate(&quotes).unwrap();
        assert!(opp.is_same_venue());
        assert_eq!(opp.net_profit, dec!(400000));
        assert_eq!(opp.profit_percent, dec!(10));
    }

    #[test]
    fn test_deterministic() {
        let quotes = vec![
            quote("nobitex", dec!(1049500), dec!(1051000), dec!(0.002)),
            quote("ramzinex", dec!(1048000), dec!(1052500), dec!(0.0015)),
            quote("tabdeal", dec!(1050100), dec!(1049000), dec!(0.002)),
        ];

        let first = evaluator().evaluate(&quotes).unwrap();
        for _ in 0..5 {
            assert_eq!(evaluator().evaluate(&quotes).unwrap(), first);
        }
    }

    #[test]
    fn test_negative_profit_is_still_reported() {
        let quotes = vec![
            quote("nobitex", dec!(1000), dec!(999), dec!(0.002)),
            quote("tabdeal", dec!(1001), dec!(998), dec!(0.002)),
        ];

        let opp = evaluator().evaluate(&quotes).unwrap();
        assert!(opp.net_profit < Decimal::ZERO);
        assert!(opp.profit_percent < Decimal::ZERO);
    }

    #[test]
    fn test_trade_amount_is_quantized() {
        let quotes = vec![
            quote("nobitex", dec!(1049500), dec!(1049000), dec!(0.002)),
            quote("tabdeal", dec!(1050100), dec!(1052500), dec!(0.002)),
        ];

        let opp = evaluator().evaluate(&quotes).unwrap();

        // 4000000 / 1049500 = 3.811338732729871...
        assert_eq!(opp.trade_amount, dec!(3.81133873));
        assert!(opp.trade_amount.scale() <= USDT_DECIMALS);
        assert_eq!(opp.gross_sell, opp.trade_amount * dec!(1052500));
    }

    #[test]
    fn test_requires_two_quotes() {
        let single = vec![quote("nobitex", dec!(1000), dec!(1010), dec!(0.002))];

        assert_eq!(evaluator().evaluate(&[]), Err(EvaluationError::InsufficientQuotes(0)));
        assert_eq!(evaluator().evaluate(&single), Err(EvaluationError::InsufficientQuotes(1)));
    }
}
