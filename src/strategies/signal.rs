use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::common::{format_grouped, format_percentage};
use crate::config::TradingConfig;
use crate::constants::LIVE_CHART_URL;
use crate::monitoring::{InlineButton, Notifier, OutboundMessage, ParseMode};
use crate::storage::WalletLedger;
use crate::types::ArbitrageOpportunity;

/// What happened to one evaluated opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Profit or size under the configured minimum
    BelowThreshold,
    /// The buy venue wallet could not cover the trade
    InsufficientBalance,
    Sent,
    /// Ledger was updated but the message did not go out
    DeliveryFailed,
}

/// Gates opportunities, books them in the ledger and announces them
pub struct SignalDispatcher {
    notifier: Arc<dyn Notifier>,
    chat_id: i64,
    min_profit_percent: Decimal,
    min_trade_amount: Decimal,
}

impl SignalDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, chat_id: i64, trading: &TradingConfig) -> Self {
        Self {
            notifier,
            chat_id,
            min_profit_percent: trading.min_profit_percent,
            min_trade_amount: trading.min_trade_amount,
        }
    }

    /// Both minimums must hold; either boundary value passes
    pub fn passes_gate(&self, opportunity: &ArbitrageOpportunity) -> bool {
        opportunity.profit_percent >= self.min_profit_percent
            && opportunity.trade_amount >= self.min_trade_amount
    }

    pub async fn dispatch(
        &self,
        opportunity: &ArbitrageOpportunity,
        ledger: &mut WalletLedger,
    ) -> DispatchOutcome {
        if !self.passes_gate(opportunity) {
            info!(
                "📉 Not worth it: {} profit, {} USDT (need {}% and {} USDT)",
                format_percentage(opportunity.profit_percent),
                format_grouped(opportunity.trade_amount, 2),
                self.min_profit_percent,
                self.min_trade_amount
            );
            return DispatchOutcome::BelowThreshold;
        }

        let buy = &opportunity.buy_venue.venue;
        let sell = &opportunity.sell_venue.venue;
        if !ledger.apply_transfer(buy, sell, opportunity.trade_amount).await {
            warn!("⚠️ Not enough USDT on {} to follow this signal", buy);
            return DispatchOutcome::InsufficientBalance;
        }

        match self.notifier.send(&self.format_signal(opportunity)).await {
            Ok(()) => {
                info!(
                    "🚀 Signal sent: {} → {}, {} profit",
                    buy,
                    sell,
                    format_percentage(opportunity.profit_percent)
                );
                DispatchOutcome::Sent
            }
            Err(e) => {
                error!("❌ Failed to send signal: {}", e);
                DispatchOutcome::DeliveryFailed
            }
        }
    }

    pub fn format_signal(&self, opportunity: &ArbitrageOpportunity) -> OutboundMessage {
        let buy = &opportunity.buy_venue;
        let sell = &opportunity.sell_venue;

        let text = format!(
            "🚀 *USDT arbitrage signal*\n\
             💰 Capital: {} toman\n\
             🔻 Buy on {}: {} toman\n\
             🔺 Sell on {}: {} toman\n\
             📊 USDT amount: {}\n\
             💵 Net profit: {} toman ({})\n\
             ⏳ Valid for: a short time",
            format_grouped(opportunity.capital, 0),
            buy.venue,
            format_price(buy.buy_price),
            sell.venue,
            format_price(sell.sell_price),
            format_grouped(opportunity.trade_amount, 2),
            format_grouped(opportunity.net_profit, 0),
            format_percentage(opportunity.profit_percent),
        );

        OutboundMessage {
            chat_id: self.chat_id,
            text,
            buttons: vec![
                vec![InlineButton::link(format!("Buy on {}", buy.venue), &buy.reference_url)],
                vec![InlineButton::link(format!("Sell on {}", sell.venue), &sell.reference_url)],
                vec![InlineButton::link("Live chart", LIVE_CHART_URL)],
            ],
            parse_mode: Some(ParseMode::Markdown),
        }
    }
}

/// Prices keep whatever precision the venue quoted
fn format_price(price: Decimal) -> String {
    let price = price.normalize();
    format_grouped(price, price.scale())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::constants::VENUES;
    use crate::mocks::{MemoryWalletStore, RecordingNotifier};
    use crate::types::Quote;
    use rust_decimal_macros::dec;

    fn opportunity(profit_percent: Decimal, trade_amount: Decimal) -> ArbitrageOpportunity {
        ArbitrageOpportunity {
            buy_venue: Quote::new("nobitex", dec!(1000), dec!(990), dec!(0.002), "https://nobitex.ir/market/USDTIRT")
                .unwrap(),
            sell_venue: Quote::new("ramzinex", dec!(1060), dec!(1050), dec!(0.0015), "https://ramzinex.com/exchange/USDT-IRR")
                .unwrap(),
            capital: dec!(4000000),
            trade_amount,
            gross_sell: trade_amount * dec!(1050),
            net_profit: dec!(185700),
            profit_percent,
        }
    }

    async fn setup(notifier: Arc<RecordingNotifier>) -> (SignalDispatcher, WalletLedger, Arc<MemoryWalletStore>) {
        let config = Config::load_test_config();
        let store = Arc::new(MemoryWalletStore::new());
        let ledger = WalletLedger::load(store.clone(), &VENUES, dec!(500)).await;
        let dispatcher = SignalDispatcher::new(notifier, config.telegram.chat_id, &config.trading);
        (dispatcher, ledger, store)
    }

    #[tokio::test]
    async fn test_gate_boundaries() {
        let (dispatcher, _, _) = setup(Arc::new(RecordingNotifier::new())).await;

        assert!(dispatcher.passes_gate(&opportunity(dec!(1.5), dec!(100))));
        assert!(!dispatcher.passes_gate(&opportunity(dec!(1.49999), dec!(100))));
        assert!(!dispatcher.passes_gate(&opportunity(dec!(5), dec!(99.99))));
        assert!(!dispatcher.passes_gate(&opportunity(dec!(-2), dec!(4000))));
    }

    #[tokio::test]
    async fn test_below_threshold_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (dispatcher, mut ledger, store) = setup(notifier.clone()).await;

        let outcome = dispatcher.dispatch(&opportunity(dec!(1.49999), dec!(100)), &mut ledger).await;

        assert_eq!(outcome, DispatchOutcome::BelowThreshold);
        assert_eq!(notifier.attempts(), 0);
        assert_eq!(store.save_count(), 0);
        assert_eq!(ledger.balance("nobitex"), dec!(500));
    }

    #[tokio::test]
    async fn test_profitable_signal_moves_funds_and_sends() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (dispatcher, mut ledger, _) = setup(notifier.clone()).await;

        let outcome = dispatcher.dispatch(&opportunity(dec!(1.5), dec!(100)), &mut ledger).await;

        assert_eq!(outcome, DispatchOutcome::Sent);
        assert_eq!(ledger.balance("nobitex"), dec!(400));
        assert_eq!(ledger.balance("ramzinex"), dec!(600));

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].chat_id, 42);
        assert_eq!(messages[0].parse_mode, Some(ParseMode::Markdown));
    }

    #[tokio::test]
    async fn test_insufficient_balance_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (dispatcher, mut ledger, store) = setup(notifier.clone()).await;

        let outcome = dispatcher.dispatch(&opportunity(dec!(4.6425), dec!(4000)), &mut ledger).await;

        assert_eq!(outcome, DispatchOutcome::InsufficientBalance);
        assert_eq!(notifier.attempts(), 0);
        assert_eq!(store.save_count(), 0);
        assert_eq!(ledger.total(), dec!(1500));
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_transfer() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let (dispatcher, mut ledger, store) = setup(notifier.clone()).await;

        let outcome = dispatcher.dispatch(&opportunity(dec!(2), dec!(250)), &mut ledger).await;

        assert_eq!(outcome, DispatchOutcome::DeliveryFailed);
        assert_eq!(notifier.attempts(), 1);
        assert_eq!(ledger.balance("nobitex"), dec!(250));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_signal_message_layout() {
        let (dispatcher, _, _) = setup(Arc::new(RecordingNotifier::new())).await;

        let message = dispatcher.format_signal(&opportunity(dec!(4.6425), dec!(4000)));

        assert!(message.text.contains("Capital: 4,000,000 toman"));
        assert!(message.text.contains("Buy on nobitex: 1,000 toman"));
        assert!(message.text.contains("Sell on ramzinex: 1,050 toman"));
        assert!(message.text.contains("USDT amount: 4,000.00"));
        assert!(message.text.contains("Net profit: 185,700 toman (4.64%)"));

        assert_eq!(message.buttons.len(), 3);
        assert_eq!(message.buttons[0][0].url, "https://nobitex.ir/market/USDTIRT");
        assert_eq!(message.buttons[1][0].text, "Sell on ramzinex");
        assert_eq!(message.buttons[2][0].url, LIVE_CHART_URL);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(1049500)), "1,049,500");
        assert_eq!(format_price(dec!(1049500.50)), "1,049,500.5");
    }
}
