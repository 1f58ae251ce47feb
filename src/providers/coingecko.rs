use super::util::{http_client, json_f64, with_retry};
use crate::core::provider::{MarketFeed, MarketQuote};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// Reference price and 24h volume from the CoinGecko `simple/price` endpoint.
pub struct CoinGeckoFeed {
    base_url: String,
    coin_id: String,
    client: reqwest::Client,
}

impl CoinGeckoFeed {
    pub fn new(base_url: &str, coin_id: &str) -> Result<Self> {
        Ok(CoinGeckoFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            coin_id: coin_id.to_string(),
            client: http_client()?,
        })
    }
}

fn parse_quote(body: &Value, coin_id: &str) -> Result<MarketQuote> {
    let coin = body
        .get(coin_id)
        .ok_or_else(|| anyhow!("Market response has no entry for {coin_id}"))?;
    let price = coin
        .get("usd")
        .and_then(json_f64)
        .ok_or_else(|| anyhow!("Market response has no USD price for {coin_id}"))?;
    let volume = coin.get("usd_24h_vol").and_then(json_f64).unwrap_or(0.0);
    Ok(MarketQuote { price, volume })
}

#[async_trait]
impl MarketFeed for CoinGeckoFeed {
    #[instrument(name = "CoinGeckoQuote", skip(self), fields(coin = %self.coin_id))]
    async fn get_reference_price_and_volume(&self) -> Result<MarketQuote> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_vol=true",
            self.base_url, self.coin_id
        );

        let response = with_retry(|| async { self.client.get(&url).send().await }, 1, 500)
            .await
            .context("Market price request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("Market price request returned HTTP {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse market price response")?;
        let quote = parse_quote(&body, &self.coin_id)?;
        debug!(price = quote.price, volume = quote.volume, "Fetched market quote");
        Ok(quote)
    }
}
