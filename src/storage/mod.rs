//! Persistent bot state
//!
//! Only the simulated wallet balances survive a restart.

pub mod wallet;

pub use wallet::{JsonWalletStore, StorageError, WalletLedger, WalletStore};
