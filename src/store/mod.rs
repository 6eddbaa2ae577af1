use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::StoreError;
use crate::models::PoolMetadata;

pub mod http;
pub mod memory;

pub use http::HttpMetadataStore;
pub use memory::MemoryMetadataStore;

/// Persistent token -> pool configuration mapping.
#[async_trait]
pub trait PoolMetadataStore: Send + Sync {
    async fn get(&self, token: &Address, chain_id: u64) -> Result<Option<PoolMetadata>, StoreError>;

    async fn get_many(
        &self,
        tokens: &[Address],
        chain_id: u64,
    ) -> Result<HashMap<Address, Option<PoolMetadata>>, StoreError> {
        let mut found = HashMap::with_capacity(tokens.len());
        for token in tokens {
            found.insert(*token, self.get(token, chain_id).await?);
        }
        Ok(found)
    }
}

/// Cache-through wrapper: answers from the TTL cache first and only asks the
/// inner store for misses. Concurrent misses on the same key may both fetch;
/// the last write wins.
pub struct CachedMetadataStore<S> {
    inner: S,
    cache: TtlCache<(u64, Address), PoolMetadata>,
}

impl<S: PoolMetadataStore> CachedMetadataStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn invalidate(&self, token: &Address, chain_id: u64) {
        self.cache.invalidate(&(chain_id, *token));
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Like `get`, but only returns entries the router may use.
    pub async fn get_active(
        &self,
        token: &Address,
        chain_id: u64,
    ) -> Result<Option<PoolMetadata>, StoreError> {
        Ok(self.get(token, chain_id).await?.filter(|meta| {
            if !meta.is_active() {
                tracing::debug!(%token, status = ?meta.status, "skipping inactive pool metadata");
            }
            meta.is_active()
        }))
    }
}

#[async_trait]
impl<S: PoolMetadataStore> PoolMetadataStore for CachedMetadataStore<S> {
    async fn get(
        &self,
        token: &Address,
        chain_id: u64,
    ) -> Result<Option<PoolMetadata>, StoreError> {
        if let Some(hit) = self.cache.get(&(chain_id, *token)) {
            return Ok(Some(hit));
        }
        let fetched = self.inner.get(token, chain_id).await?;
        if let Some(meta) = &fetched {
            self.cache.insert((chain_id, *token), meta.clone());
        }
        Ok(fetched)
    }

    async fn get_many(
        &self,
        tokens: &[Address],
        chain_id: u64,
    ) -> Result<HashMap<Address, Option<PoolMetadata>>, StoreError> {
        let mut found = HashMap::with_capacity(tokens.len());
        let mut misses = Vec::new();
        for token in tokens {
            match self.cache.get(&(chain_id, *token)) {
                Some(hit) => {
                    found.insert(*token, Some(hit));
                }
                None => misses.push(*token),
            }
        }
        if misses.is_empty() {
            return Ok(found);
        }

        let fetched = self.inner.get_many(&misses, chain_id).await?;
        for token in misses {
            let meta = fetched.get(&token).cloned().flatten();
            if let Some(meta) = &meta {
                self.cache.insert((chain_id, token), meta.clone());
            }
            found.insert(token, meta);
        }
        Ok(found)
    }
}
