//! Opportunity detection and signalling

pub mod arbitrage;
pub mod signal;

pub use arbitrage::{ArbitrageEvaluator, EvaluationError};
pub use signal::{DispatchOutcome, SignalDispatcher};
