//! Portfolio valuation.
//!
//! A pure recomputation of `(wallets, market state) -> PortfolioView`. It is
//! re-run whenever either input changes; nothing here is incremental.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::config::ValuationConfig;
use super::market::MarketState;
use super::wallet::{Address, Holding, Wallet, WalletId, non_negative};

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingView {
    pub symbol: String,
    pub name: String,
    pub balance: f64,
    pub price: f64,
    pub value: f64,
    pub is_native: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletView {
    pub id: WalletId,
    pub address: Address,
    pub display_name: String,
    pub resolved_name: Option<String>,
    pub holdings: Vec<HoldingView>,
    /// Sum over all holdings, including ones hidden from `holdings` later.
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionEntry {
    pub symbol: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioView {
    pub wallets: Vec<WalletView>,
    pub total: f64,
    pub distribution: Vec<DistributionEntry>,
    pub market: MarketState,
}

/// Shape of the asset distribution table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionRules {
    pub limit: usize,
    /// Entries worth this much or less are left out.
    pub min_value: f64,
}

impl Default for DistributionRules {
    fn default() -> Self {
        DistributionRules {
            limit: 5,
            min_value: 0.0,
        }
    }
}

impl From<&ValuationConfig> for DistributionRules {
    fn from(config: &ValuationConfig) -> Self {
        DistributionRules {
            limit: config.distribution_limit,
            min_value: non_negative(config.distribution_min_value),
        }
    }
}

/// The live snapshot always wins for the native asset; the price embedded
/// by the discovery provider is only used for tokens.
pub fn effective_price(holding: &Holding, market: &MarketState) -> f64 {
    if holding.is_native {
        market.native_price()
    } else {
        holding.price
    }
}

pub fn compute_portfolio_view(
    wallets: &[Wallet],
    market: &MarketState,
    rules: DistributionRules,
) -> PortfolioView {
    let mut by_symbol: HashMap<&str, f64> = HashMap::new();
    let mut total = 0.0;

    let wallet_views = wallets
        .iter()
        .map(|wallet| {
            let holdings: Vec<HoldingView> = wallet
                .holdings
                .iter()
                .map(|holding| {
                    let price = effective_price(holding, market);
                    let value = holding.value_at(price);
                    *by_symbol.entry(holding.symbol.as_str()).or_insert(0.0) += value;
                    HoldingView {
                        symbol: holding.symbol.clone(),
                        name: holding.name.clone(),
                        balance: holding.balance,
                        price,
                        value,
                        is_native: holding.is_native,
                    }
                })
                .collect();
            let wallet_total: f64 = holdings.iter().map(|h| h.value).sum();
            total += wallet_total;

            WalletView {
                id: wallet.id,
                address: wallet.address.clone(),
                display_name: wallet.display_name(),
                resolved_name: wallet.resolved_name.clone(),
                holdings,
                total: wallet_total,
            }
        })
        .collect();

    PortfolioView {
        wallets: wallet_views,
        total,
        distribution: distribution_table(by_symbol, rules),
        market: *market,
    }
}

fn distribution_table(by_symbol: HashMap<&str, f64>, rules: DistributionRules) -> Vec<DistributionEntry> {
    let min_value = non_negative(rules.min_value);
    let mut entries: Vec<DistributionEntry> = by_symbol
        .into_iter()
        .filter(|(_, value)| *value > min_value)
        .map(|(symbol, value)| DistributionEntry {
            symbol: symbol.to_string(),
            value,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    entries.truncate(rules.limit);
    entries
}

/// Caches the last view keyed on the wallet list version and market state.
#[derive(Default)]
pub struct Valuator {
    last: Option<(u64, MarketState, DistributionRules, PortfolioView)>,
}

impl Valuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(
        &mut self,
        wallets_version: u64,
        wallets: &[Wallet],
        market: &MarketState,
        rules: DistributionRules,
    ) -> &PortfolioView {
        let fresh = matches!(
            &self.last,
            Some((version, state, cached_rules, _))
                if *version == wallets_version && state == market && *cached_rules == rules
        );
        if !fresh {
            self.last = None;
        }
        let (_, _, _, view) = self.last.get_or_insert_with(|| {
            (
                wallets_version,
                *market,
                rules,
                compute_portfolio_view(wallets, market, rules),
            )
        });
        view
    }
}
