use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::common::{Sleeper, TokioSleeper};
use crate::config::{Config, SchedulerConfig};
use crate::exchange::{ExchangeClientFactory, QuoteAggregator, QuoteSource, RetryPolicy};
use crate::mocks::{get_mock_config, LogNotifier, MockQuoteSource};
use crate::monitoring::{Notifier, TelegramNotifier};
use crate::storage::{JsonWalletStore, WalletLedger};
use crate::strategies::{ArbitrageEvaluator, DispatchOutcome, SignalDispatcher};
use crate::types::ArbitrageOpportunity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling,
    Evaluating,
    Dispatching,
    Sleeping,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Too few venues answered to compare prices
    Skipped { quotes: usize, failed_venues: Vec<String> },
    Evaluated {
        opportunity: ArbitrageOpportunity,
        outcome: DispatchOutcome,
    },
    /// The cycle returned an error or panicked
    Faulted(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Pause taken after the cycle
    pub slept: Duration,
}

#[derive(Debug, Clone)]
pub struct CycleStats {
    pub cycles: u64,
    pub skipped: u64,
    pub signals_sent: u64,
    pub faults: u64,
    pub started_at: Instant,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self {
            cycles: 0,
            skipped: 0,
            signals_sent: 0,
            faults: 0,
            started_at: Instant::now(),
        }
    }
}

impl CycleStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Skipped { .. } => self.skipped += 1,
            CycleOutcome::Evaluated {
                outcome: DispatchOutcome::Sent,
                ..
            } => self.signals_sent += 1,
            CycleOutcome::Evaluated { .. } => {}
            CycleOutcome::Faulted(_) => self.faults += 1,
        }
    }
}

/// Poll → evaluate → dispatch → sleep, forever
///
/// Every cycle runs behind a fault boundary: an error or a panic is logged
/// and followed by the shorter error backoff, never by an exit.
pub struct Scheduler {
    aggregator: QuoteAggregator,
    evaluator: ArbitrageEvaluator,
    dispatcher: SignalDispatcher,
    ledger: WalletLedger,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
    error_backoff: Duration,
    state: SchedulerState,
    stats: CycleStats,
}

impl Scheduler {
    pub fn new(
        aggregator: QuoteAggregator,
        evaluator: ArbitrageEvaluator,
        dispatcher: SignalDispatcher,
        ledger: WalletLedger,
        sleeper: Arc<dyn Sleeper>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            aggregator,
            evaluator,
            dispatcher,
            ledger,
            sleeper,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            error_backoff: Duration::from_secs(config.error_backoff_secs),
            state: SchedulerState::Idle,
            stats: CycleStats::default(),
        }
    }

    /// Wire live venues and Telegram, or simulated ones in mock mode
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (sources, notifier): (Vec<Arc<dyn QuoteSource>>, Arc<dyn Notifier>) = if config.mock_mode {
            let mock = get_mock_config();
            let sources = config
                .get_enabled_venues()
                .into_iter()
                .map(|venue| Arc::new(MockQuoteSource::simulated(venue, &mock)) as Arc<dyn QuoteSource>)
                .collect();
            (sources, Arc::new(LogNotifier))
        } else {
            (
                ExchangeClientFactory::create_sources(config)?,
                Arc::new(TelegramNotifier::new(&config.telegram, config.fetch_timeout())?),
            )
        };

        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        let chat_id = config.telegram.chat_id;

        let venues: Vec<&str> = sources.iter().map(|source| source.venue()).collect();
        let store = Arc::new(JsonWalletStore::new(&config.wallet.path));
        let ledger = WalletLedger::load(store, &venues, config.wallet.seed_balance).await;

        let aggregator = QuoteAggregator::new(
            sources,
            RetryPolicy::from_config(&config.fetch),
            sleeper.clone(),
            notifier.clone(),
            chat_id,
        );
        let dispatcher = SignalDispatcher::new(notifier, chat_id, &config.trading);

        Ok(Self::new(
            aggregator,
            ArbitrageEvaluator::new(config.trading.capital),
            dispatcher,
            ledger,
            sleeper,
            &config.scheduler,
        ))
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn ledger(&self) -> &WalletLedger {
        &self.ledger
    }

    pub async fn run(&mut self) {
        info!(
            "🚀 Arbitrage bot started: watching {}",
            self.aggregator.venues().join(", ")
        );

        loop {
            self.tick().await;
        }
    }

    /// One full cycle including the pause that follows it
    pub async fn tick(&mut self) -> CycleReport {
        let result = AssertUnwindSafe(self.run_cycle()).catch_unwind().await;

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!("❌ Cycle failed: {:#}", e);
                CycleOutcome::Faulted(e.to_string())
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!("💥 Cycle panicked: {}", reason);
                CycleOutcome::Faulted(reason)
            }
        };

        let slept = match outcome {
            CycleOutcome::Faulted(_) => self.error_backoff,
            _ => self.poll_interval,
        };

        self.stats.record(&outcome);
        self.log_stats();

        self.state = SchedulerState::Sleeping;
        debug!("😴 Sleeping {:?}", slept);
        self.sleeper.sleep(slept).await;

        CycleReport { outcome, slept }
    }

    async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.state = SchedulerState::Polling;
        let collection = self.aggregator.collect().await;

        if collection.quotes.len() < 2 {
            warn!(
                "⚠️ Only {} venue(s) answered, skipping evaluation",
                collection.quotes.len()
            );
            return Ok(CycleOutcome::Skipped {
                quotes: collection.quotes.len(),
                failed_venues: collection.failed_venues,
            });
        }

        self.state = SchedulerState::Evaluating;
        let opportunity = self.evaluator.evaluate(&collection.quotes)?;

        self.state = SchedulerState::Dispatching;
        let outcome = self.dispatcher.dispatch(&opportunity, &mut self.ledger).await;

        Ok(CycleOutcome::Evaluated { opportunity, outcome })
    }

    fn log_stats(&self) {
        let stats = &self.stats;
        info!(
            "📊 cycles={} signals={} skipped={} faults={} uptime={}s",
            stats.cycles,
            stats.signals_sent,
            stats.skipped,
            stats.faults,
            stats.started_at.elapsed().as_secs()
        );
        debug!("💼 wallets: {:?}", self.ledger.balances());
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
