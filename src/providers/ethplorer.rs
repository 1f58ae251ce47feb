use super::util::{http_client, json_f64, json_str, json_u32, with_retry};
use crate::core::provider::{AddressAssets, AssetDiscoveryProvider, TokenBalance};
use crate::core::wallet::Address;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// Asset discovery through an Ethplorer-compatible `getAddressInfo` API.
pub struct EthplorerProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl EthplorerProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(EthplorerProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client()?,
        })
    }
}

/// Extracts balances from an address info payload.
///
/// A payload without a readable native balance is rejected so the caller
/// can fall back; individual malformed tokens are skipped.
fn parse_address_info(body: &Value) -> Result<AddressAssets> {
    if let Some(err) = body.get("error") {
        let message = err
            .get("message")
            .and_then(json_str)
            .unwrap_or_else(|| err.to_string());
        return Err(anyhow!("Provider returned error: {message}"));
    }

    let native = body
        .get("ETH")
        .ok_or_else(|| anyhow!("Response has no native balance section"))?;
    let native_balance = native
        .get("balance")
        .and_then(json_f64)
        .ok_or_else(|| anyhow!("Native balance missing or not numeric"))?;
    let native_price = native
        .get("price")
        .and_then(|p| p.get("rate"))
        .and_then(json_f64);

    let tokens = body
        .get("tokens")
        .and_then(Value::as_array)
        .map(|tokens| tokens.iter().filter_map(parse_token).collect())
        .unwrap_or_default();

    Ok(AddressAssets {
        native_balance,
        native_price,
        tokens,
    })
}

fn parse_token(token: &Value) -> Option<TokenBalance> {
    let info = token.get("tokenInfo")?;
    let raw_balance = token
        .get("rawBalance")
        .and_then(json_f64)
        .or_else(|| token.get("balance").and_then(json_f64))?;

    Some(TokenBalance {
        symbol: info.get("symbol").and_then(json_str),
        name: info.get("name").and_then(json_str),
        raw_balance,
        decimals: info.get("decimals").and_then(json_u32),
        // `price` is `false` for unpriced tokens.
        price_rate: info
            .get("price")
            .and_then(|p| p.get("rate"))
            .and_then(json_f64),
    })
}

#[async_trait]
impl AssetDiscoveryProvider for EthplorerProvider {
    #[instrument(name = "EthplorerAssets", skip(self), fields(address = %address))]
    async fn get_address_assets(&self, address: &Address) -> Result<AddressAssets> {
        let url = format!(
            "{}/getAddressInfo/{}?apiKey={}",
            self.base_url, address, self.api_key
        );
        debug!("Requesting address assets for {}", address);

        let response = with_retry(|| async { self.client.get(&url).send().await }, 2, 300)
            .await
            .with_context(|| format!("Asset discovery request failed for {address}"))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse asset discovery response for {address}"))?;
        if !status.is_success() && body.get("error").is_none() {
            return Err(anyhow!("Asset discovery returned HTTP {status}"));
        }

        let assets = parse_address_info(&body)?;
        debug!(
            native_balance = assets.native_balance,
            tokens = assets.tokens.len(),
            "Parsed address assets"
        );
        Ok(assets)
    }
}
