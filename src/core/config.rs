use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use super::wallet::Address;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SeedWallet {
    pub address: Address,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DiscoveryProviderConfig {
    pub base_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

fn default_api_key() -> String {
    "freekey".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NamingProviderConfig {
    pub base_url: String,
    /// How long resolved names are cached, in seconds.
    #[serde(default = "default_name_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_name_ttl() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RpcProviderConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MarketProviderConfig {
    pub base_url: String,
    #[serde(default = "default_coin_id")]
    pub coin_id: String,
}

fn default_coin_id() -> String {
    "ethereum".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub discovery: DiscoveryProviderConfig,
    pub naming: NamingProviderConfig,
    pub rpc: RpcProviderConfig,
    pub market: MarketProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            discovery: DiscoveryProviderConfig {
                base_url: "https://api.ethplorer.io".to_string(),
                api_key: default_api_key(),
            },
            naming: NamingProviderConfig {
                base_url: "https://api.ensideas.com".to_string(),
                cache_ttl_secs: default_name_ttl(),
            },
            rpc: RpcProviderConfig {
                url: "https://cloudflare-eth.com".to_string(),
            },
            market: MarketProviderConfig {
                base_url: "https://api.coingecko.com/api/v3".to_string(),
                coin_id: default_coin_id(),
            },
        }
    }
}

/// Thresholds used while discovering, valuing and displaying holdings.
///
/// `discovery_min_value` decides which tokens are ever stored;
/// `dust_threshold` only decides which stored holdings are hidden.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ValuationConfig {
    pub hide_dust: bool,
    pub dust_threshold: f64,
    pub discovery_min_value: f64,
    pub distribution_limit: usize,
    pub distribution_min_value: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        ValuationConfig {
            hide_dust: true,
            dust_threshold: 1.0,
            discovery_min_value: 0.0,
            distribution_limit: 5,
            distribution_min_value: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub user: String,
    #[serde(default)]
    pub wallets: Vec<SeedWallet>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub valuation: ValuationConfig,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Seconds between wallet re-enrichment in `watch`.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    pub data_path: Option<String>,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_refresh_interval() -> u64 {
    300
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "scopto", "scopto")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "scopto", "scopto")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
