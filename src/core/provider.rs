//! Data provider abstractions consumed by the enrichment pipeline and the
//! market poller

use anyhow::Result;
use async_trait::async_trait;

use super::wallet::Address;

/// A non-native token balance as reported by the asset discovery provider.
///
/// Everything except the raw balance is optional because upstream payloads
/// are frequently incomplete.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenBalance {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub raw_balance: f64,
    pub decimals: Option<u32>,
    pub price_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddressAssets {
    /// Native balance, already in native units.
    pub native_balance: f64,
    /// Native price embedded in the discovery payload, if any. Usually stale.
    pub native_price: Option<f64>,
    pub tokens: Vec<TokenBalance>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketQuote {
    pub price: f64,
    pub volume: f64,
}

/// Reverse name lookup.
#[async_trait]
pub trait NamingProvider: Send + Sync {
    async fn resolve_name(&self, address: &Address) -> Result<Option<String>>;
}

/// Primary source of balances: native plus every token with embedded prices.
#[async_trait]
pub trait AssetDiscoveryProvider: Send + Sync {
    async fn get_address_assets(&self, address: &Address) -> Result<AddressAssets>;
}

/// Fallback source that only knows the native balance.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// Raw native balance in the smallest unit (wei).
    async fn get_native_balance(&self, address: &Address) -> Result<f64>;
}

/// Reference price and trading volume for the native asset.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn get_reference_price_and_volume(&self) -> Result<MarketQuote>;
}
