use super::util::{http_client, json_str, with_retry};
use crate::core::provider::NamingProvider;
use crate::core::wallet::Address;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// Reverse ENS lookup through an HTTP resolver (`/ens/resolve/{address}`).
pub struct EnsProvider {
    base_url: String,
    client: reqwest::Client,
}

impl EnsProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(EnsProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl NamingProvider for EnsProvider {
    #[instrument(name = "EnsReverseLookup", skip(self), fields(address = %address))]
    async fn resolve_name(&self, address: &Address) -> Result<Option<String>> {
        let url = format!("{}/ens/resolve/{}", self.base_url, address);

        let response = with_retry(|| async { self.client.get(&url).send().await }, 1, 200)
            .await
            .with_context(|| format!("Name lookup request failed for {address}"))?;
        if !response.status().is_success() {
            return Err(anyhow!("Name lookup returned HTTP {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse name lookup response")?;
        let name = body.get("name").and_then(json_str);
        debug!(?name, "Resolved name");
        Ok(name)
    }
}
