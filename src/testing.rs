//! Scripted provider and fixtures shared by unit tests.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::dex::{AmmQueryProvider, SimulationRequest};
use crate::error::{ProviderError, StoreError};
use crate::models::{PoolFormat, PoolKey, PoolLiquidity, PoolMetadata, Reserves, Token};
use crate::store::{MemoryMetadataStore, PoolMetadataStore};

pub const Q96: u128 = 1u128 << 96;

pub fn token(last_byte: u8, symbol: &str) -> Token {
    Token::new(Address::with_last_byte(last_byte), 18, symbol)
}

#[derive(Debug, Clone)]
pub enum MockQuote {
    Fixed(U256),
    /// `amount_in * num / den`
    Ratio(u64, u64),
    Fail(ProviderError),
}

#[derive(Debug, Clone)]
struct MockPool {
    liquidity: u128,
    quote: MockQuote,
}

#[derive(Default)]
pub struct MockProvider {
    pairs: HashMap<(Address, Address), Reserves>,
    pools: HashMap<(PoolFormat, PoolKey), MockPool>,
    native: HashMap<(Address, Address), PoolMetadata>,
    failing_pairs: HashMap<(Address, Address), ProviderError>,
    failing_everything: Option<ProviderError>,
    delay: Option<Duration>,
    pair_calls: Mutex<HashMap<(Address, Address), usize>>,
    native_calls: Mutex<usize>,
    simulations: Mutex<Vec<SimulationRequest>>,
    liquidity_calls: Mutex<usize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(mut self, a: &Token, b: &Token, reserve_a: u64, reserve_b: u64) -> Self {
        let (ra, rb) = (U256::from(reserve_a), U256::from(reserve_b));
        self.pairs.insert((a.address, b.address), Reserves::new(ra, rb));
        self.pairs.insert((b.address, a.address), Reserves::new(rb, ra));
        self
    }

    pub fn with_pool(
        mut self,
        format: PoolFormat,
        key: PoolKey,
        liquidity: u128,
        quote: MockQuote,
    ) -> Self {
        self.pools.insert((format, key), MockPool { liquidity, quote });
        self
    }

    pub fn with_native(mut self, token: &Token, other: &Token, metadata: PoolMetadata) -> Self {
        self.native.insert((token.address, other.address), metadata);
        self
    }

    /// Every reserve lookup for this pair (either direction) fails.
    pub fn with_failing_pair(mut self, a: &Token, b: &Token, error: ProviderError) -> Self {
        self.failing_pairs.insert((a.address, b.address), error.clone());
        self.failing_pairs.insert((b.address, a.address), error);
        self
    }

    pub fn failing_everything(mut self, error: ProviderError) -> Self {
        self.failing_everything = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn pair_calls(&self, a: &Token, b: &Token) -> usize {
        self.pair_calls
            .lock()
            .unwrap()
            .get(&(a.address, b.address))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        let pairs: usize = self.pair_calls.lock().unwrap().values().sum();
        pairs
            + *self.native_calls.lock().unwrap()
            + *self.liquidity_calls.lock().unwrap()
            + self.simulations.lock().unwrap().len()
    }

    pub fn native_calls(&self) -> usize {
        *self.native_calls.lock().unwrap()
    }

    pub fn simulations(&self) -> Vec<SimulationRequest> {
        self.simulations.lock().unwrap().clone()
    }

    async fn pause(&self) -> Result<(), ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failing_everything {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AmmQueryProvider for MockProvider {
    fn identifier(&self) -> &str {
        "MOCK"
    }

    async fn pair_reserves(
        &self,
        token_in: &Token,
        token_out: &Token,
    ) -> Result<Option<Reserves>, ProviderError> {
        let key = (token_in.address, token_out.address);
        *self.pair_calls.lock().unwrap().entry(key).or_insert(0) += 1;
        self.pause().await?;
        if let Some(error) = self.failing_pairs.get(&key) {
            return Err(error.clone());
        }
        Ok(self.pairs.get(&key).copied())
    }

    async fn pool_liquidity(
        &self,
        format: PoolFormat,
        key: &PoolKey,
    ) -> Result<Option<PoolLiquidity>, ProviderError> {
        *self.liquidity_calls.lock().unwrap() += 1;
        self.pause().await?;
        Ok(self.pools.get(&(format, key.clone())).map(|pool| PoolLiquidity {
            liquidity: pool.liquidity,
            sqrt_price_x96: U256::from(Q96),
        }))
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<U256, ProviderError> {
        self.simulations.lock().unwrap().push(request.clone());
        self.pause().await?;
        let pool = self
            .pools
            .get(&(request.format, request.pool_key.clone()))
            .ok_or_else(|| ProviderError::Reverted { code: "PoolNotInitialized".to_string() })?;
        match &pool.quote {
            MockQuote::Fixed(amount) => Ok(*amount),
            MockQuote::Ratio(num, den) => {
                Ok(request.amount_in * U256::from(*num) / U256::from(*den))
            }
            MockQuote::Fail(error) => Err(error.clone()),
        }
    }

    async fn native_pool_lookup(
        &self,
        token_a: &Token,
        token_b: &Token,
    ) -> Result<Option<PoolMetadata>, ProviderError> {
        *self.native_calls.lock().unwrap() += 1;
        self.pause().await?;
        Ok(self.native.get(&(token_a.address, token_b.address)).cloned())
    }
}

/// Memory store that counts round trips to it.
pub struct CountingStore {
    inner: MemoryMetadataStore,
    calls: Mutex<usize>,
    last_batch: Mutex<Vec<Address>>,
}

impl CountingStore {
    pub fn new(inner: MemoryMetadataStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(0),
            last_batch: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn last_batch(&self) -> Vec<Address> {
        self.last_batch.lock().unwrap().clone()
    }
}

#[async_trait]
impl PoolMetadataStore for CountingStore {
    async fn get(
        &self,
        token: &Address,
        chain_id: u64,
    ) -> Result<Option<PoolMetadata>, StoreError> {
        *self.calls.lock().unwrap() += 1;
        self.inner.get(token, chain_id).await
    }

    async fn get_many(
        &self,
        tokens: &[Address],
        chain_id: u64,
    ) -> Result<HashMap<Address, Option<PoolMetadata>>, StoreError> {
        *self.calls.lock().unwrap() += 1;
        *self.last_batch.lock().unwrap() = tokens.to_vec();
        let mut found = HashMap::new();
        for token in tokens {
            found.insert(*token, self.inner.get(token, chain_id).await?);
        }
        Ok(found)
    }
}

/// Store whose backend is down.
pub struct UnavailableStore;

#[async_trait]
impl PoolMetadataStore for UnavailableStore {
    async fn get(
        &self,
        _token: &Address,
        _chain_id: u64,
    ) -> Result<Option<PoolMetadata>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}
