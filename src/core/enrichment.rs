//! Turns bare saved addresses into named wallets with valued holdings.
//!
//! Every wallet is enriched independently and all of them are awaited
//! together, so one slow or failing address never holds back or discards
//! the others. Provider failures are absorbed here: naming errors yield no
//! name, discovery errors fall back to the native-only balance provider, and
//! a wallet nobody can resolve simply ends up with no holdings.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::provider::{AddressAssets, AssetDiscoveryProvider, BalanceProvider, NamingProvider};
use super::units::{DEFAULT_DECIMALS, normalize_balance};
use super::wallet::{Address, Holding, Wallet, non_negative};

/// Outcome of enriching a single address.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Enrichment {
    pub resolved_name: Option<String>,
    pub holdings: Vec<Holding>,
}

pub struct Orchestrator {
    naming: Arc<dyn NamingProvider>,
    discovery: Arc<dyn AssetDiscoveryProvider>,
    balance: Arc<dyn BalanceProvider>,
    discovery_min_value: f64,
}

impl Orchestrator {
    pub fn new(
        naming: Arc<dyn NamingProvider>,
        discovery: Arc<dyn AssetDiscoveryProvider>,
        balance: Arc<dyn BalanceProvider>,
    ) -> Self {
        Orchestrator {
            naming,
            discovery,
            balance,
            discovery_min_value: 0.0,
        }
    }

    /// Tokens worth this much or less are dropped at discovery time.
    pub fn with_discovery_min_value(mut self, min_value: f64) -> Self {
        self.discovery_min_value = non_negative(min_value);
        self
    }

    /// Enriches every wallet concurrently and returns them in input order.
    pub async fn enrich_all(&self, wallets: &[Wallet]) -> Vec<Wallet> {
        let futures = wallets.iter().map(|wallet| async move {
            let enrichment = self.enrich_address(&wallet.address).await;
            Wallet {
                resolved_name: enrichment.resolved_name,
                holdings: enrichment.holdings,
                ..wallet.clone()
            }
        });
        join_all(futures).await
    }

    #[instrument(name = "EnrichWallet", skip(self), fields(address = %address))]
    pub async fn enrich_address(&self, address: &Address) -> Enrichment {
        let (resolved_name, holdings) =
            tokio::join!(self.resolve_name(address), self.discover_holdings(address));
        debug!(
            name = ?resolved_name,
            holdings = holdings.len(),
            "Enrichment finished"
        );
        Enrichment {
            resolved_name,
            holdings,
        }
    }

    async fn resolve_name(&self, address: &Address) -> Option<String> {
        match self.naming.resolve_name(address).await {
            Ok(name) => name.filter(|n| !n.trim().is_empty()),
            Err(e) => {
                debug!(error = %e, "Name resolution failed");
                None
            }
        }
    }

    async fn discover_holdings(&self, address: &Address) -> Vec<Holding> {
        match self.discovery.get_address_assets(address).await {
            Ok(assets) => holdings_from_assets(&assets, self.discovery_min_value),
            Err(e) => {
                warn!(error = %e, "Asset discovery failed, falling back to native balance");
                self.native_only_holdings(address).await
            }
        }
    }

    async fn native_only_holdings(&self, address: &Address) -> Vec<Holding> {
        match self.balance.get_native_balance(address).await {
            Ok(raw) => {
                let balance = normalize_balance(raw, Some(DEFAULT_DECIMALS));
                if balance > 0.0 {
                    // Price is filled in from the market snapshot at valuation time.
                    vec![Holding::native(balance, 0.0)]
                } else {
                    Vec::new()
                }
            }
            Err(e) => {
                warn!(error = %e, "Native balance lookup failed");
                Vec::new()
            }
        }
    }
}

/// Builds holdings from a discovery payload.
///
/// The native asset is kept whenever its balance is positive, whatever its
/// embedded price. Tokens are kept only if their normalized value exceeds
/// `min_value`.
pub fn holdings_from_assets(assets: &AddressAssets, min_value: f64) -> Vec<Holding> {
    let mut holdings = Vec::with_capacity(assets.tokens.len() + 1);

    let native_balance = non_negative(assets.native_balance);
    if native_balance > 0.0 {
        holdings.push(Holding::native(
            native_balance,
            assets.native_price.unwrap_or(0.0),
        ));
    }

    for token in &assets.tokens {
        let balance = normalize_balance(token.raw_balance, token.decimals);
        let price = non_negative(token.price_rate.unwrap_or(0.0));
        let value = balance * price;
        if value <= min_value {
            continue;
        }

        let symbol = token
            .symbol
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(token.name.as_deref())
            .unwrap_or("UNKNOWN");
        let name = token
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(symbol);
        holdings.push(Holding::token(symbol, name, balance, price));
    }

    holdings
}
