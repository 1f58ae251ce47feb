//! User-visible notices

use thiserror::Error;

use super::wallet::WalletId;

/// Errors surfaced to the user. Provider failures never end up here; they
/// are recovered inside the enrichment pipeline and the market poller.
#[derive(Debug, Error)]
pub enum Notice {
    #[error("Invalid Ethereum address: {0:?}")]
    InvalidAddress(String),

    #[error("Wallet {0} is already tracked")]
    AlreadyTracked(String),

    #[error("No tracked wallet with id {0}")]
    UnknownWallet(WalletId),

    #[error("Could not save wallet changes: {0:#}")]
    Persistence(anyhow::Error),

    #[error("Not signed in")]
    SignedOut,
}
