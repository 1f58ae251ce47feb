use super::{WalletStore, WalletTable};
use crate::core::wallet::{NewWallet, Wallet, WalletId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Wallet store backed by a single YAML file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a failed write leaves the previous contents intact.
pub struct FileWalletStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileWalletStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_table(&self) -> Result<WalletTable> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(WalletTable::default()),
            Ok(contents) => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse wallet file: {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Wallet file {} not found, starting empty", self.path.display());
                Ok(WalletTable::default())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read wallet file: {}", self.path.display())),
        }
    }

    async fn write_table(&self, table: &WalletTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let contents = serde_yaml::to_string(table).context("Failed to serialize wallets")?;
        let tmp_path = self.path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp_path, contents)
            .await
            .with_context(|| format!("Failed to write wallet file: {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace wallet file: {}", self.path.display()))?;
        debug!("Saved wallets to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl WalletStore for FileWalletStore {
    async fn list(&self, owner: &str) -> Result<Vec<Wallet>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_table().await?.list(owner))
    }

    async fn insert(&self, wallet: NewWallet) -> Result<Wallet> {
        let _guard = self.lock.lock().await;
        let mut table = self.read_table().await?;
        let created = table.insert(wallet);
        self.write_table(&table).await?;
        Ok(created)
    }

    async fn rename(&self, owner: &str, id: WalletId, label: Option<String>) -> Result<Wallet> {
        let _guard = self.lock.lock().await;
        let mut table = self.read_table().await?;
        let renamed = table.rename(owner, id, label)?;
        self.write_table(&table).await?;
        Ok(renamed)
    }

    async fn remove(&self, owner: &str, id: WalletId) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut table = self.read_table().await?;
        if !table.remove(owner, id) {
            return Ok(false);
        }
        self.write_table(&table).await?;
        Ok(true)
    }
}
