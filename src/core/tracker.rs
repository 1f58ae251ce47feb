//! Session-scoped owner of the wallet list.
//!
//! The tracker is the only writer of the in-memory wallet list. User edits go
//! through the store first and are applied locally only once persisted.
//! Enrichment runs in batches tagged with the session they were started for;
//! a batch finishing after logout or a user switch is discarded. A market
//! poller attached to the session is stopped when the session ends.

use std::sync::Arc;
use tracing::{debug, info};

use super::config::{SeedWallet, ValuationConfig};
use super::dust;
use super::enrichment::Orchestrator;
use super::error::Notice;
use super::market::{MarketState, PollerHandle};
use super::valuation::{DistributionRules, PortfolioView, Valuator};
use super::wallet::{Address, NewWallet, Wallet, WalletId};
use crate::store::WalletStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTag {
    pub user: String,
    pub generation: u64,
}

/// Wallets captured for enrichment, tagged with the session that asked.
#[derive(Debug, Clone)]
pub struct RefreshBatch {
    pub tag: SessionTag,
    pub wallets: Vec<Wallet>,
}

impl RefreshBatch {
    pub async fn run(self, orchestrator: &Orchestrator) -> EnrichedBatch {
        let wallets = orchestrator.enrich_all(&self.wallets).await;
        EnrichedBatch {
            tag: self.tag,
            wallets,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    pub tag: SessionTag,
    pub wallets: Vec<Wallet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// The session changed while the batch was in flight.
    Stale,
}

pub struct WalletTracker {
    store: Arc<dyn WalletStore>,
    session: Option<SessionTag>,
    generation: u64,
    wallets: Vec<Wallet>,
    version: u64,
    valuator: Valuator,
    poller: Option<PollerHandle>,
}

impl WalletTracker {
    pub fn new(store: Arc<dyn WalletStore>, user: &str) -> Self {
        WalletTracker {
            store,
            session: Some(SessionTag {
                user: user.to_string(),
                generation: 0,
            }),
            generation: 0,
            wallets: Vec::new(),
            version: 0,
            valuator: Valuator::new(),
            poller: None,
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user.as_str())
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    /// Bumped on every change to the wallet list.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn active(&self) -> Result<&SessionTag, Notice> {
        self.session.as_ref().ok_or(Notice::SignedOut)
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    /// Reloads the saved list, keeping enrichment for wallets that are
    /// still there.
    pub async fn load(&mut self) -> Result<usize, Notice> {
        let tag = self.active()?.clone();
        let mut fresh = self
            .store
            .list(&tag.user)
            .await
            .map_err(Notice::Persistence)?;

        for wallet in &mut fresh {
            if let Some(known) = self
                .wallets
                .iter()
                .find(|w| w.id == wallet.id && w.address == wallet.address)
            {
                wallet.resolved_name = known.resolved_name.clone();
                wallet.holdings = known.holdings.clone();
            }
        }
        self.wallets = fresh;
        self.touch();
        Ok(self.wallets.len())
    }

    /// Tracks seed wallets that are not saved yet. Returns how many were added.
    pub async fn seed(&mut self, seeds: &[SeedWallet]) -> Result<usize, Notice> {
        let mut added = 0;
        for seed in seeds {
            if self.wallets.iter().any(|w| w.address == seed.address) {
                continue;
            }
            self.track(seed.address.as_str(), seed.label.clone()).await?;
            added += 1;
        }
        Ok(added)
    }

    /// Validates and saves a new wallet. Nothing is stored or fetched for an
    /// invalid address.
    pub async fn track(&mut self, address: &str, label: Option<String>) -> Result<Wallet, Notice> {
        let address = Address::parse(address)?;
        let user = self.active()?.user.clone();
        if self.wallets.iter().any(|w| w.address == address) {
            return Err(Notice::AlreadyTracked(address.to_string()));
        }

        let created = self
            .store
            .insert(NewWallet {
                owner: user,
                address,
                label: clean_label(label),
            })
            .await
            .map_err(Notice::Persistence)?;

        info!(id = created.id, address = %created.address, "Tracking wallet");
        self.wallets.push(created.clone());
        self.touch();
        Ok(created)
    }

    pub async fn untrack(&mut self, id: WalletId) -> Result<(), Notice> {
        let user = self.active()?.user.clone();
        if !self.wallets.iter().any(|w| w.id == id) {
            return Err(Notice::UnknownWallet(id));
        }

        self.store
            .remove(&user, id)
            .await
            .map_err(Notice::Persistence)?;

        info!(id, "Stopped tracking wallet");
        self.wallets.retain(|w| w.id != id);
        self.touch();
        Ok(())
    }

    pub async fn rename(&mut self, id: WalletId, label: Option<String>) -> Result<(), Notice> {
        let user = self.active()?.user.clone();
        if !self.wallets.iter().any(|w| w.id == id) {
            return Err(Notice::UnknownWallet(id));
        }

        let saved = self
            .store
            .rename(&user, id, clean_label(label))
            .await
            .map_err(Notice::Persistence)?;

        if let Some(wallet) = self.wallets.iter_mut().find(|w| w.id == id) {
            wallet.label = saved.label;
        }
        self.touch();
        Ok(())
    }

    pub fn begin_refresh(&self) -> Result<RefreshBatch, Notice> {
        let tag = self.active()?.clone();
        Ok(RefreshBatch {
            tag,
            wallets: self.wallets.clone(),
        })
    }

    /// Applies a finished batch if it still belongs to the current session.
    ///
    /// Wallets untracked since the batch started are skipped; labels edited
    /// meanwhile are kept.
    pub fn publish(&mut self, batch: EnrichedBatch) -> PublishOutcome {
        if self.session.as_ref() != Some(&batch.tag) {
            debug!(
                batch_user = %batch.tag.user,
                batch_generation = batch.tag.generation,
                "Discarding stale enrichment batch"
            );
            return PublishOutcome::Stale;
        }

        for enriched in batch.wallets {
            if let Some(wallet) = self
                .wallets
                .iter_mut()
                .find(|w| w.id == enriched.id && w.address == enriched.address)
            {
                wallet.resolved_name = enriched.resolved_name;
                wallet.holdings = enriched.holdings;
            }
        }
        self.touch();
        PublishOutcome::Published
    }

    /// Runs one enrichment batch for the current session.
    pub async fn refresh(&mut self, orchestrator: &Orchestrator) -> Result<PublishOutcome, Notice> {
        let batch = self.begin_refresh()?;
        let enriched = batch.run(orchestrator).await;
        Ok(self.publish(enriched))
    }

    /// Ties a running market poller to the current session. A poller that
    /// was already attached is stopped first.
    pub async fn attach_poller(&mut self, handle: PollerHandle) {
        self.stop_poller().await;
        self.poller = Some(handle);
    }

    /// Stops the attached poller, if any. Nothing is published afterwards.
    pub async fn stop_poller(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.stop().await;
            debug!("Stopped session market poller");
        }
    }

    /// Ends the session. Pending batches become stale and the attached
    /// poller is stopped.
    pub async fn logout(&mut self) {
        self.stop_poller().await;
        self.generation += 1;
        self.session = None;
        self.wallets.clear();
        self.touch();
        info!("Signed out");
    }

    /// Starts a new session for `user`. Pending batches become stale and the
    /// previous session's poller is stopped.
    pub async fn sign_in(&mut self, user: &str) {
        self.stop_poller().await;
        self.generation += 1;
        self.session = Some(SessionTag {
            user: user.to_string(),
            generation: self.generation,
        });
        self.wallets.clear();
        self.touch();
        info!(user, "Signed in");
    }

    pub fn view(&mut self, market: &MarketState, rules: DistributionRules) -> &PortfolioView {
        self.valuator
            .view(self.version, &self.wallets, market, rules)
    }

    /// Valued portfolio with dust hidden according to `config`.
    pub fn projected(&mut self, market: &MarketState, config: &ValuationConfig) -> PortfolioView {
        let view = self.view(market, DistributionRules::from(config));
        dust::project(view, config.hide_dust, config.dust_threshold)
    }
}

fn clean_label(label: Option<String>) -> Option<String> {
    label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::{MarketPoller, MarketSnapshot, SnapshotCell};
    use crate::core::provider::{
        AddressAssets, AssetDiscoveryProvider, BalanceProvider, MarketFeed, MarketQuote,
        NamingProvider, TokenBalance,
    };
    use crate::store::memory::MemoryWalletStore;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const ALICE_MAIN: &str = "0x00000000000000000000000000000000000000a1";
    const ALICE_COLD: &str = "0x00000000000000000000000000000000000000a2";

    /// Every address holds 1 ETH and 150 USDC.
    #[derive(Default)]
    struct CountingProviders {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NamingProvider for CountingProviders {
        async fn resolve_name(&self, _address: &Address) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    #[async_trait]
    impl AssetDiscoveryProvider for CountingProviders {
        async fn get_address_assets(&self, _address: &Address) -> Result<AddressAssets> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AddressAssets {
                native_balance: 1.0,
                native_price: Some(0.0),
                tokens: vec![
                    TokenBalance {
                        symbol: Some("USDC".to_string()),
                        name: Some("USD Coin".to_string()),
                        raw_balance: 150_000_000.0,
                        decimals: Some(6),
                        price_rate: Some(1.0),
                    },
                    TokenBalance {
                        symbol: Some("DUST".to_string()),
                        name: None,
                        raw_balance: 0.5e18,
                        decimals: None,
                        price_rate: Some(1.0),
                    },
                ],
            })
        }
    }

    #[async_trait]
    impl BalanceProvider for CountingProviders {
        async fn get_native_balance(&self, _address: &Address) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0.0)
        }
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore(MemoryWalletStore);

    #[async_trait]
    impl WalletStore for ReadOnlyStore {
        async fn list(&self, owner: &str) -> Result<Vec<Wallet>> {
            self.0.list(owner).await
        }

        async fn insert(&self, _wallet: NewWallet) -> Result<Wallet> {
            Err(anyhow!("permission denied"))
        }

        async fn rename(&self, _owner: &str, _id: WalletId, _label: Option<String>) -> Result<Wallet> {
            Err(anyhow!("permission denied"))
        }

        async fn remove(&self, _owner: &str, _id: WalletId) -> Result<bool> {
            Err(anyhow!("permission denied"))
        }
    }

    fn counting_orchestrator() -> (Orchestrator, Arc<CountingProviders>) {
        let providers = Arc::new(CountingProviders::default());
        let orchestrator =
            Orchestrator::new(providers.clone(), providers.clone(), providers.clone());
        (orchestrator, providers)
    }

    fn live(price: f64) -> MarketState {
        MarketState::Live(MarketSnapshot {
            price,
            volume: 0.0,
            fetched_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_without_side_effects() {
        let store = Arc::new(MemoryWalletStore::new());
        let (_orchestrator, providers) = counting_orchestrator();
        let mut tracker = WalletTracker::new(store.clone(), "alice");
        let version = tracker.version();

        let result = tracker.track("0x1234", None).await;
        assert!(matches!(result, Err(Notice::InvalidAddress(_))));
        assert!(tracker.wallets().is_empty());
        assert_eq!(tracker.version(), version);
        assert!(store.list("alice").await.unwrap().is_empty());
        assert_eq!(providers.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_track_rename_untrack() {
        let store = Arc::new(MemoryWalletStore::new());
        let mut tracker = WalletTracker::new(store.clone(), "alice");

        let wallet = tracker
            .track(&ALICE_MAIN.to_uppercase().replace("0X", "0x"), Some("  Main  ".to_string()))
            .await
            .unwrap();
        assert_eq!(wallet.address.as_str(), ALICE_MAIN);
        assert_eq!(wallet.label.as_deref(), Some("Main"));

        let duplicate = tracker.track(ALICE_MAIN, None).await;
        assert!(matches!(duplicate, Err(Notice::AlreadyTracked(_))));

        tracker.rename(wallet.id, Some(" ".to_string())).await.unwrap();
        assert!(tracker.wallets()[0].label.is_none());

        tracker.untrack(wallet.id).await.unwrap();
        assert!(tracker.wallets().is_empty());
        assert!(store.list("alice").await.unwrap().is_empty());

        assert!(matches!(
            tracker.untrack(wallet.id).await,
            Err(Notice::UnknownWallet(_))
        ));
    }

    #[tokio::test]
    async fn test_persistence_failure_leaves_state_unchanged() {
        let inner = MemoryWalletStore::new();
        inner
            .insert(NewWallet {
                owner: "alice".to_string(),
                address: Address::parse(ALICE_MAIN).unwrap(),
                label: Some("Main".to_string()),
            })
            .await
            .unwrap();
        let mut tracker = WalletTracker::new(Arc::new(ReadOnlyStore(inner)), "alice");
        tracker.load().await.unwrap();
        let before = tracker.wallets().to_vec();
        let id = before[0].id;

        assert!(matches!(
            tracker.track(ALICE_COLD, None).await,
            Err(Notice::Persistence(_))
        ));
        assert!(matches!(
            tracker.rename(id, Some("Renamed".to_string())).await,
            Err(Notice::Persistence(_))
        ));
        assert!(matches!(
            tracker.untrack(id).await,
            Err(Notice::Persistence(_))
        ));
        assert_eq!(tracker.wallets(), before.as_slice());
    }

    #[tokio::test]
    async fn test_refresh_publishes_and_projects() {
        let store = Arc::new(MemoryWalletStore::new());
        let (orchestrator, _) = counting_orchestrator();
        let mut tracker = WalletTracker::new(store, "alice");
        tracker.track(ALICE_MAIN, None).await.unwrap();
        tracker.track(ALICE_COLD, None).await.unwrap();

        let outcome = tracker.refresh(&orchestrator).await.unwrap();
        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(tracker.wallets()[0].holdings.len(), 3);

        let config = ValuationConfig::default();
        let view = tracker.view(&live(2000.0), DistributionRules::from(&config)).clone();
        assert_eq!(view.total, 2.0 * (2000.0 + 150.0 + 0.5));

        let projected = tracker.projected(&live(2000.0), &config);
        assert_eq!(projected.total, view.total);
        assert!(projected.wallets.iter().all(|w| w.holdings.len() == 2));
        assert_eq!(projected.distribution[0].symbol, "ETH");
        assert_eq!(projected.distribution[0].value, 4000.0);
    }

    #[tokio::test]
    async fn test_batch_is_discarded_after_logout() {
        let store = Arc::new(MemoryWalletStore::new());
        let (orchestrator, _) = counting_orchestrator();
        let mut tracker = WalletTracker::new(store, "alice");
        tracker.track(ALICE_MAIN, None).await.unwrap();

        let batch = tracker.begin_refresh().unwrap();
        tracker.logout().await;
        let enriched = batch.run(&orchestrator).await;

        assert_eq!(tracker.publish(enriched), PublishOutcome::Stale);
        assert!(tracker.wallets().is_empty());
        assert!(matches!(tracker.begin_refresh(), Err(Notice::SignedOut)));
        assert!(matches!(
            tracker.track(ALICE_COLD, None).await,
            Err(Notice::SignedOut)
        ));
    }

    #[tokio::test]
    async fn test_batch_is_discarded_after_user_switch() {
        let store = Arc::new(MemoryWalletStore::new());
        let (orchestrator, _) = counting_orchestrator();
        let mut tracker = WalletTracker::new(store, "alice");
        tracker.track(ALICE_MAIN, None).await.unwrap();
        let batch = tracker.begin_refresh().unwrap();

        tracker.sign_in("bob").await;
        tracker.track(ALICE_COLD, None).await.unwrap();
        let enriched = batch.run(&orchestrator).await;

        assert_eq!(tracker.publish(enriched), PublishOutcome::Stale);
        assert_eq!(tracker.user(), Some("bob"));
        assert!(tracker.wallets()[0].holdings.is_empty());

        // Switching back to the same user still rejects the old batch.
        let bob_batch = tracker.begin_refresh().unwrap();
        tracker.sign_in("bob").await;
        let enriched = bob_batch.run(&orchestrator).await;
        assert_eq!(tracker.publish(enriched), PublishOutcome::Stale);
    }

    #[tokio::test]
    async fn test_publish_skips_wallets_untracked_mid_flight() {
        let store = Arc::new(MemoryWalletStore::new());
        let (orchestrator, _) = counting_orchestrator();
        let mut tracker = WalletTracker::new(store, "alice");
        let main = tracker.track(ALICE_MAIN, None).await.unwrap();
        tracker.track(ALICE_COLD, None).await.unwrap();

        let batch = tracker.begin_refresh().unwrap();
        tracker.untrack(main.id).await.unwrap();
        let cold_id = tracker.wallets()[0].id;
        tracker.rename(cold_id, Some("Cold".to_string())).await.unwrap();
        let enriched = batch.run(&orchestrator).await;

        assert_eq!(tracker.publish(enriched), PublishOutcome::Published);
        assert_eq!(tracker.wallets().len(), 1);
        assert_eq!(tracker.wallets()[0].label.as_deref(), Some("Cold"));
        assert_eq!(tracker.wallets()[0].holdings.len(), 3);
    }

    #[tokio::test]
    async fn test_seed_and_reload_keep_enrichment() {
        let store = Arc::new(MemoryWalletStore::new());
        let (orchestrator, _) = counting_orchestrator();
        let mut tracker = WalletTracker::new(store, "alice");
        let seeds = vec![
            SeedWallet {
                address: Address::parse(ALICE_MAIN).unwrap(),
                label: Some("Main".to_string()),
            },
            SeedWallet {
                address: Address::parse(ALICE_COLD).unwrap(),
                label: None,
            },
        ];

        assert_eq!(tracker.seed(&seeds).await.unwrap(), 2);
        assert_eq!(tracker.seed(&seeds).await.unwrap(), 0);

        tracker.refresh(&orchestrator).await.unwrap();
        assert_eq!(tracker.load().await.unwrap(), 2);
        assert!(tracker.wallets().iter().all(|w| w.holdings.len() == 3));
    }

    /// Quotes a higher price on every call.
    #[derive(Default)]
    struct RisingFeed {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketFeed for RisingFeed {
        async fn get_reference_price_and_volume(&self) -> Result<MarketQuote> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(MarketQuote {
                price: 1000.0 * n as f64,
                volume: 1.0,
            })
        }
    }

    async fn tracker_with_live_poller(
        feed: Arc<RisingFeed>,
        cell: &SnapshotCell,
    ) -> WalletTracker {
        let mut rx = cell.subscribe();
        let mut tracker = WalletTracker::new(Arc::new(MemoryWalletStore::new()), "alice");
        let handle = MarketPoller::new(feed, cell.clone(), Duration::from_secs(30)).start();
        tracker.attach_poller(handle).await;
        rx.changed().await.unwrap();
        tracker
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_stops_session_poller() {
        let feed = Arc::new(RisingFeed::default());
        let cell = SnapshotCell::new();
        let mut tracker = tracker_with_live_poller(feed.clone(), &cell).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
        let before = cell.current();
        let rx = cell.subscribe();

        tracker.logout().await;
        tokio::time::advance(Duration::from_secs(300)).await;
        tokio::task::yield_now().await;

        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.current(), before);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_switch_stops_previous_poller() {
        let feed = Arc::new(RisingFeed::default());
        let cell = SnapshotCell::new();
        let mut tracker = tracker_with_live_poller(feed.clone(), &cell).await;
        let before = cell.current();

        tracker.sign_in("bob").await;
        tokio::time::advance(Duration::from_secs(300)).await;
        tokio::task::yield_now().await;

        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.current().native_price(), before.native_price());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attached_poller_keeps_running_during_session() {
        let feed = Arc::new(RisingFeed::default());
        let cell = SnapshotCell::new();
        let mut tracker = tracker_with_live_poller(feed.clone(), &cell).await;
        let mut rx = cell.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cell.current().native_price(), 2000.0);

        tracker.stop_poller().await;
    }
}
