//! Read-time hiding of near-zero holdings

use super::valuation::PortfolioView;
use super::wallet::non_negative;

/// Returns a copy of `view` whose itemized holdings omit anything worth
/// less than `threshold`.
///
/// Wallet totals, the grand total and the distribution are carried over
/// untouched: hidden holdings still count.
pub fn project(view: &PortfolioView, hide_dust: bool, threshold: f64) -> PortfolioView {
    let mut projected = view.clone();
    if !hide_dust {
        return projected;
    }
    let threshold = non_negative(threshold);

    for wallet in &mut projected.wallets {
        wallet.holdings.retain(|h| h.value >= threshold);
    }
    projected
}

/// Number of holdings `project` would hide.
pub fn hidden_count(view: &PortfolioView, hide_dust: bool, threshold: f64) -> usize {
    if !hide_dust {
        return 0;
    }
    let threshold = non_negative(threshold);
    view.wallets
        .iter()
        .flat_map(|w| w.holdings.iter())
        .filter(|h| h.value < threshold)
        .count()
}
