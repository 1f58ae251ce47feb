use super::util::{http_client, with_retry};
use crate::core::provider::BalanceProvider;
use crate::core::units::parse_raw_amount;
use crate::core::wallet::Address;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

/// Native balance lookup over Ethereum JSON-RPC (`eth_getBalance`).
pub struct JsonRpcBalanceProvider {
    url: String,
    client: reqwest::Client,
}

impl JsonRpcBalanceProvider {
    pub fn new(url: &str) -> Result<Self> {
        Ok(JsonRpcBalanceProvider {
            url: url.to_string(),
            client: http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[async_trait]
impl BalanceProvider for JsonRpcBalanceProvider {
    #[instrument(name = "RpcNativeBalance", skip(self), fields(address = %address))]
    async fn get_native_balance(&self, address: &Address) -> Result<f64> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getBalance",
            "params": [address.as_str(), "latest"],
        });

        let response = with_retry(
            || async { self.client.post(&self.url).json(&request).send().await },
            2,
            300,
        )
        .await
        .with_context(|| format!("Balance request failed for {address}"))?;
        if !response.status().is_success() {
            return Err(anyhow!("Balance request returned HTTP {}", response.status()));
        }

        let body: RpcResponse = response
            .json()
            .await
            .context("Failed to parse JSON-RPC response")?;
        if let Some(err) = body.error {
            return Err(anyhow!("JSON-RPC error {}: {}", err.code, err.message));
        }

        let raw = body
            .result
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_raw_amount)
            .ok_or_else(|| anyhow!("JSON-RPC result missing or not a quantity"))?;
        debug!(raw, "Fetched native balance");
        Ok(raw)
    }
}
