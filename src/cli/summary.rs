use super::ui;
use crate::core::config::ValuationConfig;
use crate::core::dust;
use crate::core::enrichment::Orchestrator;
use crate::core::market::{MarketPoller, MarketState, SnapshotCell};
use crate::core::tracker::WalletTracker;
use crate::core::valuation::{DistributionRules, PortfolioView, WalletView};
use anyhow::Result;
use comfy_table::Cell;
use tracing::warn;

impl WalletView {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Asset"),
            ui::header_cell("Balance"),
            ui::header_cell("Price"),
            ui::header_cell("Value"),
        ]);

        for holding in &self.holdings {
            table.add_row(vec![
                Cell::new(format!("{} ({})", holding.symbol, holding.name)),
                Cell::new(ui::format_balance(holding.balance)),
                ui::price_cell(holding.price),
                ui::usd_cell(holding.value),
            ]);
        }

        let mut output = format!(
            "Wallet #{}: {}  {}\n\n",
            self.id,
            ui::style_text(&self.display_name, ui::StyleType::Title),
            ui::style_text(self.address.as_str(), ui::StyleType::Subtle)
        );
        if self.holdings.is_empty() {
            output.push_str(&ui::style_text("No holdings to show", ui::StyleType::Subtle));
        } else {
            output.push_str(&table.to_string());
        }
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Wallet Total", ui::StyleType::TotalLabel),
            ui::style_text(&ui::format_usd(self.total), ui::StyleType::TotalValue)
        ));
        output
    }
}

fn market_line(market: &MarketState) -> String {
    match market.snapshot() {
        Some(snapshot) => format!(
            "Market: {}  ETH {}  24h volume {}  (as of {})",
            market.status_label(),
            ui::format_usd(snapshot.price),
            ui::format_usd(snapshot.volume),
            snapshot.fetched_at.format("%H:%M:%S UTC")
        ),
        None => ui::style_text(
            &format!("Market: {}", market.status_label()),
            ui::StyleType::Subtle,
        ),
    }
}

fn distribution_table(view: &PortfolioView) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Value"),
        ui::header_cell("Share (%)"),
    ]);
    for entry in &view.distribution {
        let share = if view.total > 0.0 {
            entry.value / view.total * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(&entry.symbol),
            ui::usd_cell(entry.value),
            Cell::new(format!("{share:.2}%")),
        ]);
    }
    table.to_string()
}

/// Renders the whole portfolio. Holdings under `threshold` are left out of
/// the wallet tables when `hide_dust` is set; totals always include them.
pub fn render(view: &PortfolioView, hide_dust: bool, threshold: f64) -> String {
    if view.wallets.is_empty() {
        return format!(
            "{}\n\n{}",
            ui::style_text(
                "No wallets tracked. Add one with `scopto track <address>`.",
                ui::StyleType::Subtle
            ),
            market_line(&view.market)
        );
    }

    let hidden = dust::hidden_count(view, hide_dust, threshold);
    let projected = dust::project(view, hide_dust, threshold);
    let separator = format!("\n{}\n", "─".repeat(ui::term_width()));

    let mut output = projected
        .wallets
        .iter()
        .map(WalletView::display_as_table)
        .collect::<Vec<_>>()
        .join(&separator);

    if hidden > 0 {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!(
                    "{hidden} holding(s) under {} hidden. Use --show-dust to list them.",
                    ui::format_usd(threshold)
                ),
                ui::StyleType::Subtle
            )
        ));
    }

    if !projected.distribution.is_empty() {
        output.push_str(&format!(
            "\n\n{}\n\n{}",
            ui::style_text("Top Assets", ui::StyleType::Title),
            distribution_table(&projected)
        ));
    }

    output.push_str(&format!(
        "\n\n{}: {}\n{}",
        ui::style_text("Grand Total", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(projected.total), ui::StyleType::TotalValue),
        market_line(&projected.market)
    ));
    output
}

/// One-shot summary: enrich every wallet and fetch a market quote at the
/// same time, then print the valued portfolio.
pub async fn run(
    tracker: &mut WalletTracker,
    orchestrator: &Orchestrator,
    poller: &MarketPoller,
    cell: &SnapshotCell,
    valuation: &ValuationConfig,
    show_dust: bool,
) -> Result<()> {
    let spinner = ui::new_spinner("Fetching balances and prices...");
    let (refreshed, live) = tokio::join!(tracker.refresh(orchestrator), poller.poll_once());
    spinner.finish_and_clear();
    refreshed?;
    if !live {
        warn!("No market price available, native holdings are shown without a price");
    }

    let view = tracker.view(&cell.current(), DistributionRules::from(valuation));
    println!(
        "{}",
        render(view, valuation.hide_dust && !show_dust, valuation.dust_threshold)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::MarketSnapshot;
    use crate::core::valuation::compute_portfolio_view;
    use crate::core::wallet::{Address, Holding, Wallet};
    use chrono::Utc;

    fn wallets() -> Vec<Wallet> {
        vec![Wallet {
            id: 7,
            owner: "alice".to_string(),
            address: Address::parse(&format!("0x{:040x}", 7)).unwrap(),
            label: Some("Cold storage".to_string()),
            resolved_name: Some("alice.eth".to_string()),
            created_at: Utc::now(),
            holdings: vec![
                Holding::native(2.0, 0.0),
                Holding::token("USDC", "USD Coin", 500.0, 1.0),
                Holding::token("DUST", "Dust Token", 0.5, 1.0),
            ],
        }]
    }

    fn live_market() -> MarketState {
        MarketState::Live(MarketSnapshot {
            price: 2000.0,
            volume: 1e9,
            fetched_at: Utc::now(),
        })
    }

    #[test]
    fn test_render_hides_dust_but_keeps_total() {
        let view =
            compute_portfolio_view(&wallets(), &live_market(), DistributionRules::default());
        let output = render(&view, true, 1.0);

        assert!(output.contains("Cold storage"));
        assert!(output.contains("USDC"));
        assert!(!output.contains("Dust Token"));
        assert!(output.contains("1 holding(s) under $1.00 hidden"));
        assert!(output.contains("$4,500.50"));
        assert!(output.contains("Market: live"));
    }

    #[test]
    fn test_render_shows_dust_when_asked() {
        let view =
            compute_portfolio_view(&wallets(), &live_market(), DistributionRules::default());
        let output = render(&view, false, 1.0);

        assert!(output.contains("Dust Token"));
        assert!(!output.contains("hidden"));
    }

    #[test]
    fn test_render_while_market_is_connecting() {
        let view =
            compute_portfolio_view(&wallets(), &MarketState::Idle, DistributionRules::default());
        let output = render(&view, false, 1.0);

        assert!(output.contains("Market: connecting"));
        assert!(output.contains("N/A"));
        assert!(output.contains("$500.50"));
    }

    #[test]
    fn test_render_without_wallets() {
        let view = compute_portfolio_view(&[], &MarketState::Idle, DistributionRules::default());
        assert!(render(&view, true, 1.0).contains("No wallets tracked"));
    }
}
