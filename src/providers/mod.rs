pub mod caching;
pub mod coingecko;
pub mod ens;
pub mod ethplorer;
pub mod rpc;
pub mod util;

pub use caching::CachingNamingProvider;
pub use coingecko::CoinGeckoFeed;
pub use ens::EnsProvider;
pub use ethplorer::EthplorerProvider;
pub use rpc::JsonRpcBalanceProvider;
