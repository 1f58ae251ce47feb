//! Wallet enrichment, valuation and live market state

pub mod cache;
pub mod config;
pub mod dust;
pub mod enrichment;
pub mod error;
pub mod log;
pub mod market;
pub mod provider;
pub mod tracker;
pub mod units;
pub mod valuation;
pub mod wallet;

// Re-export main types for cleaner imports
pub use error::Notice;
pub use market::{MarketSnapshot, MarketState, SnapshotCell};
pub use provider::{AssetDiscoveryProvider, BalanceProvider, MarketFeed, NamingProvider};
pub use valuation::PortfolioView;
pub use wallet::{Address, Holding, Wallet};
