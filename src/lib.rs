pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::enrichment::Orchestrator;
use crate::core::market::{MarketPoller, SnapshotCell};
use crate::core::provider::MarketFeed;
use crate::core::tracker::WalletTracker;
use crate::core::wallet::WalletId;
use crate::providers::{
    CachingNamingProvider, CoinGeckoFeed, EnsProvider, EthplorerProvider, JsonRpcBalanceProvider,
};
use crate::store::file::FileWalletStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const WALLETS_FILE: &str = "wallets.yaml";

#[derive(Debug, Clone)]
pub enum AppCommand {
    Summary { show_dust: bool },
    Watch,
    Track { address: String, label: Option<String> },
    Untrack { id: WalletId },
    Rename { id: WalletId, label: Option<String> },
    Wallets,
}

/// Everything a command needs, wired from the configuration.
struct App {
    config: AppConfig,
    tracker: WalletTracker,
    orchestrator: Orchestrator,
    feed: Arc<dyn MarketFeed>,
}

impl App {
    async fn build(config: AppConfig) -> Result<Self> {
        let providers = &config.providers;
        let naming = CachingNamingProvider::new(
            EnsProvider::new(&providers.naming.base_url)?,
            Duration::from_secs(providers.naming.cache_ttl_secs),
        );
        let discovery =
            EthplorerProvider::new(&providers.discovery.base_url, &providers.discovery.api_key)?;
        let balance = JsonRpcBalanceProvider::new(&providers.rpc.url)?;
        let orchestrator = Orchestrator::new(Arc::new(naming), Arc::new(discovery), Arc::new(balance))
            .with_discovery_min_value(config.valuation.discovery_min_value);
        let feed: Arc<dyn MarketFeed> = Arc::new(CoinGeckoFeed::new(
            &providers.market.base_url,
            &providers.market.coin_id,
        )?);

        let store_path = config.default_data_path()?.join(WALLETS_FILE);
        debug!("Using wallet store at {}", store_path.display());
        let store = Arc::new(FileWalletStore::new(store_path));

        let mut tracker = WalletTracker::new(store, &config.user);
        let loaded = tracker.load().await?;
        let seeded = tracker.seed(&config.wallets).await?;
        info!(user = %config.user, loaded, seeded, "Wallets ready");

        Ok(App {
            config,
            tracker,
            orchestrator,
            feed,
        })
    }

    fn poller(&self, cell: &SnapshotCell) -> MarketPoller {
        MarketPoller::new(
            Arc::clone(&self.feed),
            cell.clone(),
            Duration::from_secs(self.config.poll_interval_secs.max(1)),
        )
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Scopto starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let mut app = App::build(config).await?;
    let cell = SnapshotCell::new();

    match command {
        AppCommand::Summary { show_dust } => {
            let poller = app.poller(&cell);
            cli::summary::run(
                &mut app.tracker,
                &app.orchestrator,
                &poller,
                &cell,
                &app.config.valuation,
                show_dust,
            )
            .await
        }
        AppCommand::Watch => {
            let poller = app.poller(&cell);
            let refresh_every = Duration::from_secs(app.config.refresh_interval_secs.max(1));
            cli::watch::run(
                &mut app.tracker,
                &app.orchestrator,
                poller,
                cell,
                &app.config.valuation,
                refresh_every,
            )
            .await
        }
        AppCommand::Track { address, label } => {
            cli::wallets::track(&mut app.tracker, &address, label).await
        }
        AppCommand::Untrack { id } => cli::wallets::untrack(&mut app.tracker, id).await,
        AppCommand::Rename { id, label } => cli::wallets::rename(&mut app.tracker, id, label).await,
        AppCommand::Wallets => cli::wallets::list(&app.tracker),
    }
}
