//! Live market snapshot and the poller that keeps it fresh

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::provider::{MarketFeed, MarketQuote};
use super::wallet::non_negative;

/// Reference price and 24h volume for the native asset, read at one point
/// in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSnapshot {
    pub price: f64,
    pub volume: f64,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn from_quote(quote: MarketQuote, fetched_at: DateTime<Utc>) -> Self {
        MarketSnapshot {
            price: non_negative(quote.price),
            volume: non_negative(quote.volume),
            fetched_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MarketState {
    /// No successful fetch yet.
    #[default]
    Idle,
    Live(MarketSnapshot),
}

impl MarketState {
    pub fn snapshot(&self) -> Option<&MarketSnapshot> {
        match self {
            MarketState::Idle => None,
            MarketState::Live(snapshot) => Some(snapshot),
        }
    }

    /// Price applied to native holdings. Zero until the first snapshot.
    pub fn native_price(&self) -> f64 {
        self.snapshot().map_or(0.0, |s| s.price)
    }

    pub fn is_live(&self) -> bool {
        matches!(self, MarketState::Live(_))
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            MarketState::Idle => "connecting",
            MarketState::Live(_) => "live",
        }
    }
}

/// Replace-only holder of the current [`MarketState`].
///
/// Snapshots are swapped in whole; readers never see a price from one fetch
/// next to a volume from another.
#[derive(Clone)]
pub struct SnapshotCell {
    tx: Arc<watch::Sender<MarketState>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(MarketState::Idle);
        SnapshotCell { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> MarketState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<MarketState> {
        self.tx.subscribe()
    }

    pub fn publish(&self, snapshot: MarketSnapshot) {
        self.tx.send_replace(MarketState::Live(snapshot));
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MarketPoller {
    feed: Arc<dyn MarketFeed>,
    cell: SnapshotCell,
    interval: Duration,
}

impl MarketPoller {
    pub fn new(feed: Arc<dyn MarketFeed>, cell: SnapshotCell, interval: Duration) -> Self {
        MarketPoller {
            feed,
            cell,
            interval,
        }
    }

    /// Fetches once and publishes on success. A failed fetch leaves the
    /// previous state in place.
    pub async fn poll_once(&self) -> bool {
        let quote = self.feed.get_reference_price_and_volume().await;
        self.apply(quote)
    }

    fn apply(&self, quote: anyhow::Result<MarketQuote>) -> bool {
        match quote {
            Ok(quote) => {
                let snapshot = MarketSnapshot::from_quote(quote, Utc::now());
                debug!(price = snapshot.price, volume = snapshot.volume, "Publishing market snapshot");
                self.cell.publish(snapshot);
                true
            }
            Err(e) => {
                warn!(error = %e, "Market poll failed, keeping previous snapshot");
                false
            }
        }
    }

    /// Spawns the polling loop. The first fetch happens immediately.
    ///
    /// Ticks run one after another on a single task, so two fetches never
    /// publish concurrently. Once the handle is stopped nothing else is
    /// published, even if a fetch was in flight.
    pub fn start(self) -> PollerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            info!(interval = ?self.interval, "Market poller started");
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let quote = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    quote = self.feed.get_reference_price_and_volume() => quote,
                };
                self.apply(quote);
            }
            info!("Market poller stopped");
        });

        PollerHandle { cancel, task }
    }
}

pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Cancels the loop and waits for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Market poller task ended abnormally");
        }
    }
}
