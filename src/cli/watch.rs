use super::{summary, ui};
use crate::core::config::ValuationConfig;
use crate::core::enrichment::Orchestrator;
use crate::core::market::{MarketPoller, SnapshotCell};
use crate::core::tracker::{PublishOutcome, WalletTracker};
use crate::core::valuation::DistributionRules;
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

fn draw(tracker: &mut WalletTracker, cell: &SnapshotCell, valuation: &ValuationConfig) {
    let term = console::Term::stdout();
    if let Err(e) = term.clear_screen() {
        debug!(error = %e, "Could not clear terminal");
    }

    let view = tracker.view(&cell.current(), DistributionRules::from(valuation));
    println!(
        "{}",
        summary::render(view, valuation.hide_dust, valuation.dust_threshold)
    );
    println!(
        "\n{}",
        ui::style_text("Press Ctrl+C to exit", ui::StyleType::Subtle)
    );
}

/// Live view until Ctrl+C.
pub async fn run(
    tracker: &mut WalletTracker,
    orchestrator: &Orchestrator,
    poller: MarketPoller,
    cell: SnapshotCell,
    valuation: &ValuationConfig,
    refresh_every: Duration,
) -> Result<()> {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")
    };
    run_until(
        tracker,
        orchestrator,
        poller,
        cell,
        valuation,
        refresh_every,
        ctrl_c,
    )
    .await
}

/// Redraws whenever the market snapshot changes or an enrichment batch
/// lands. Wallets are re-enriched every `refresh_every`, never with two
/// batches in flight. The poller belongs to the tracker's session and is
/// stopped when `shutdown` resolves.
pub async fn run_until<F>(
    tracker: &mut WalletTracker,
    orchestrator: &Orchestrator,
    poller: MarketPoller,
    cell: SnapshotCell,
    valuation: &ValuationConfig,
    refresh_every: Duration,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let mut market = cell.subscribe();
    tracker.attach_poller(poller.start()).await;

    let enrichment = tracker.begin_refresh()?.run(orchestrator);
    tokio::pin!(enrichment);
    let mut enriching = true;

    let mut refresh = tokio::time::interval_at(Instant::now() + refresh_every, refresh_every);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    draw(tracker, &cell, valuation);
    let outcome = loop {
        tokio::select! {
            result = &mut shutdown => break result,
            enriched = &mut enrichment, if enriching => {
                enriching = false;
                if tracker.publish(enriched) == PublishOutcome::Stale {
                    debug!("Enrichment finished for a previous session");
                }
            }
            _ = refresh.tick(), if !enriching => {
                match tracker.begin_refresh() {
                    Ok(batch) => {
                        debug!(wallets = batch.wallets.len(), "Refreshing wallets");
                        enrichment.set(batch.run(orchestrator));
                        enriching = true;
                    }
                    Err(notice) => break Err(notice.into()),
                }
                continue;
            }
            changed = market.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
            }
        }
        draw(tracker, &cell, valuation);
    };

    tracker.stop_poller().await;
    info!("Watch stopped");
    outcome
}
