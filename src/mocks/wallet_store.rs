use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::storage::{StorageError, WalletStore};
use crate::types::WalletSet;

/// Wallet store kept in memory, with switchable failure modes
#[derive(Debug, Default)]
pub struct MemoryWalletStore {
    state: Mutex<Option<WalletSet>>,
    saves: AtomicUsize,
    fail_saves: bool,
    corrupt: bool,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallets(wallets: WalletSet) -> Self {
        Self {
            state: Mutex::new(Some(wallets)),
            ..Self::default()
        }
    }

    /// Every save fails with an I/O error
    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    /// Loading reports unreadable state
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Option<WalletSet> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn load(&self) -> Result<Option<WalletSet>, StorageError> {
        if self.corrupt {
            return Err(StorageError::Corrupt("expected value at line 1 column 1".to_string()));
        }
        Ok(self.saved())
    }

    async fn save(&self, wallets: &WalletSet) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            )));
        }

        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(wallets.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
