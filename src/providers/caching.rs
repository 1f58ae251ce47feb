use crate::core::cache::Cache;
use crate::core::provider::NamingProvider;
use crate::core::wallet::Address;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Remembers successful reverse lookups for a while. Failures are not
/// cached so the next refresh tries again.
#[derive(Clone)]
pub struct CachingNamingProvider<T: NamingProvider> {
    inner: T,
    cache: Cache<Address, Option<String>>,
}

impl<T: NamingProvider> CachingNamingProvider<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::with_ttl(ttl),
        }
    }
}

#[async_trait]
impl<T: NamingProvider> NamingProvider for CachingNamingProvider<T> {
    async fn resolve_name(&self, address: &Address) -> Result<Option<String>> {
        if let Some(cached) = self.cache.get(address).await {
            debug!("Cache hit for name: {}", address);
            return Ok(cached);
        }
        let name = self.inner.resolve_name(address).await?;
        self.cache.put(address.clone(), name.clone()).await;
        Ok(name)
    }
}
