//! Saved wallet persistence.
//!
//! The tracker only needs a simple read/write list per owner; schema and
//! storage details stay behind [`WalletStore`].

pub mod file;
pub mod memory;

use crate::core::wallet::{Address, NewWallet, Wallet, WalletId};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn list(&self, owner: &str) -> Result<Vec<Wallet>>;

    async fn insert(&self, wallet: NewWallet) -> Result<Wallet>;

    /// Sets or clears the label. Fails if the wallet does not exist.
    async fn rename(&self, owner: &str, id: WalletId, label: Option<String>) -> Result<Wallet>;

    /// Returns `false` if there was nothing to remove.
    async fn remove(&self, owner: &str, id: WalletId) -> Result<bool>;
}

/// On-disk and in-memory representation of a saved wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWallet {
    pub id: WalletId,
    pub owner: String,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredWallet> for Wallet {
    fn from(stored: &StoredWallet) -> Self {
        Wallet {
            id: stored.id,
            owner: stored.owner.clone(),
            address: stored.address.clone(),
            label: stored.label.clone(),
            resolved_name: None,
            created_at: stored.created_at,
            holdings: Vec::new(),
        }
    }
}

/// Wallet list shared by both store implementations.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct WalletTable {
    #[serde(default)]
    next_id: WalletId,
    #[serde(default)]
    wallets: Vec<StoredWallet>,
}

impl WalletTable {
    fn list(&self, owner: &str) -> Vec<Wallet> {
        self.wallets
            .iter()
            .filter(|w| w.owner == owner)
            .map(Wallet::from)
            .collect()
    }

    fn insert(&mut self, wallet: NewWallet) -> Wallet {
        self.next_id = self
            .next_id
            .max(self.wallets.iter().map(|w| w.id).max().unwrap_or(0))
            + 1;
        let stored = StoredWallet {
            id: self.next_id,
            owner: wallet.owner,
            address: wallet.address,
            label: wallet.label,
            created_at: Utc::now(),
        };
        let created = Wallet::from(&stored);
        self.wallets.push(stored);
        created
    }

    fn rename(&mut self, owner: &str, id: WalletId, label: Option<String>) -> Result<Wallet> {
        let stored = self
            .wallets
            .iter_mut()
            .find(|w| w.id == id && w.owner == owner)
            .ok_or_else(|| anyhow::anyhow!("Wallet {id} not found"))?;
        stored.label = label;
        Ok(Wallet::from(&*stored))
    }

    fn remove(&mut self, owner: &str, id: WalletId) -> bool {
        let before = self.wallets.len();
        self.wallets.retain(|w| !(w.id == id && w.owner == owner));
        self.wallets.len() != before
    }
}
