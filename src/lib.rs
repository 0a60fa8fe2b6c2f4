// Tether arbitrage signal bot library

pub mod common;
pub mod config;
pub mod core;
pub mod exchange;
pub mod mocks;
pub mod monitoring;
pub mod storage;
pub mod strategies;

// Core types
pub mod constants;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use core::Scheduler;
pub use types::{ArbitrageOpportunity, Quote, WalletSet};

pub use common::formatting::*;
pub use common::time::*;
