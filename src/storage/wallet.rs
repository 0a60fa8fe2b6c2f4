use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, error, info, warn};

use crate::constants::USDT_DECIMALS;
use crate::types::WalletSet;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("wallet file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("wallet file is corrupt: {0}")]
    Corrupt(String),
}

/// Load/save of the whole wallet set as one blob
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet
    async fn load(&self) -> Result<Option<WalletSet>, StorageError>;

    async fn save(&self, wallets: &WalletSet) -> Result<(), StorageError>;
}

/// Pretty-printed JSON object of venue → balance
#[derive(Debug, Clone)]
pub struct JsonWalletStore {
    path: PathBuf,
}

impl JsonWalletStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl WalletStore for JsonWalletStore {
    async fn load(&self) -> Result<Option<WalletSet>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let wallets: WalletSet =
            serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        if let Some((venue, balance)) = wallets.iter().find(|(_, balance)| balance.is_sign_negative()) {
            return Err(StorageError::Corrupt(format!("{} has negative balance {}", venue, balance)));
        }

        Ok(Some(wallets))
    }

    async fn save(&self, wallets: &WalletSet) -> Result<(), StorageError> {
        let content =
            serde_json::to_string_pretty(wallets).map_err(|e| StorageError::Corrupt(e.to_string()))?;

        // write-then-rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Simulated per-venue USDT balances
///
/// Owned by the scheduler and lent mutably to the dispatcher, so every
/// check-debit-credit-persist sequence runs without interleaving.
pub struct WalletLedger {
    wallets: WalletSet,
    store: Arc<dyn WalletStore>,
}

impl WalletLedger {
    /// Restore persisted balances, or seed every venue when there are none
    pub async fn load(store: Arc<dyn WalletStore>, venues: &[&str], seed: Decimal) -> Self {
        let wallets = match store.load().await {
            Ok(Some(wallets)) => {
                info!("💼 Loaded {} wallets", wallets.len());
                wallets
            }
            Ok(None) => {
                info!("💼 No wallet state found, seeding {} per venue", seed);
                Self::seeded(venues, seed)
            }
            Err(e) => {
                // the unreadable state is discarded and overwritten on the next transfer
                error!("❌ {}; falling back to seed balances", e);
                Self::seeded(venues, seed)
            }
        };

        Self { wallets, store }
    }

    pub fn seeded(venues: &[&str], seed: Decimal) -> WalletSet {
        venues.iter().map(|venue| (venue.to_string(), seed)).collect()
    }

    /// Missing venues hold nothing
    pub fn balance(&self, venue: &str) -> Decimal {
        self.wallets.get(venue).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn balances(&self) -> &WalletSet {
        &self.wallets
    }

    pub fn total(&self) -> Decimal {
        self.wallets.values().copied().sum()
    }

    /// Move `amount` USDT from one venue to another and persist the result.
    ///
    /// The amount is truncated to `USDT_DECIMALS` places so debit and credit
    /// stay exact. Returns `false` without touching any balance when the
    /// source venue cannot cover it. A failed save is logged; memory keeps
    /// the new balances.
    pub async fn apply_transfer(&mut self, from: &str, to: &str, amount: Decimal) -> bool {
        let amount = amount.round_dp_with_strategy(USDT_DECIMALS, RoundingStrategy::ToZero);

        if amount.is_sign_negative() {
            warn!("⚠️ Refusing negative transfer of {} from {} to {}", amount, from, to);
            return false;
        }

        let available = self.balance(from);
        if available < amount {
            warn!(
                "⚠️ Insufficient balance on {}: have {}, need {}",
                from, available, amount
            );
            return false;
        }

        let debited = available - amount;
        let credited = if from == to {
            Some(available)
        } else {
            self.balance(to).checked_add(amount)
        };
        let Some(credited) = credited else {
            warn!("⚠️ Transfer of {} would overflow {} balance", amount, to);
            return false;
        };

        self.wallets.insert(from.to_string(), debited);
        self.wallets.insert(to.to_string(), credited);
        debug!("💸 {} USDT {} → {}", amount, from, to);

        if let Err(e) = self.store.save(&self.wallets).await {
            error!("❌ Failed to persist wallets: {}", e);
        }

        true
    }
}
