use super::{WalletStore, WalletTable};
use crate::core::wallet::{NewWallet, Wallet, WalletId};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// Process-local wallet store.
#[derive(Default)]
pub struct MemoryWalletStore {
    inner: Mutex<WalletTable>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn list(&self, owner: &str) -> Result<Vec<Wallet>> {
        Ok(self.inner.lock().await.list(owner))
    }

    async fn insert(&self, wallet: NewWallet) -> Result<Wallet> {
        let created = self.inner.lock().await.insert(wallet);
        debug!(id = created.id, address = %created.address, "Stored wallet");
        Ok(created)
    }

    async fn rename(&self, owner: &str, id: WalletId, label: Option<String>) -> Result<Wallet> {
        self.inner.lock().await.rename(owner, id, label)
    }

    async fn remove(&self, owner: &str, id: WalletId) -> Result<bool> {
        Ok(self.inner.lock().await.remove(owner, id))
    }
}
