//! Tiered quote discovery.
//!
//! Each request walks `Direct -> ViaBridge -> MetadataAssisted ->
//! PersistedFallback` and stops at the first tier with an executable
//! candidate. Running out of tiers is a normal "no liquidity" answer.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;

use super::encoder::encode_route;
use super::generator::{CandidateGenerator, CandidateSet};
use super::selector::select_best;
use crate::cache::TtlCache;
use crate::config::QuoterConfig;
use crate::dex::AmmQueryProvider;
use crate::error::{ProviderError, QuoteError, StoreError};
use crate::models::{
    ExecutionRoute, PoolMetadata, QuoteCandidate, QuoteRequest, SwapPath, Token,
};
use crate::store::{CachedMetadataStore, PoolMetadataStore};
use crate::utils::retry_until;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiscoveryTier {
    Direct,
    ViaBridge,
    MetadataAssisted,
    PersistedFallback,
}

impl DiscoveryTier {
    pub const ALL: [DiscoveryTier; 4] = [
        DiscoveryTier::Direct,
        DiscoveryTier::ViaBridge,
        DiscoveryTier::MetadataAssisted,
        DiscoveryTier::PersistedFallback,
    ];

    /// Path tiers retry transient provider failures; later tiers do not.
    pub fn retries_transient(self) -> bool {
        matches!(self, DiscoveryTier::Direct | DiscoveryTier::ViaBridge)
    }
}

impl fmt::Display for DiscoveryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiscoveryTier::Direct => "direct",
            DiscoveryTier::ViaBridge => "via-bridge",
            DiscoveryTier::MetadataAssisted => "metadata-assisted",
            DiscoveryTier::PersistedFallback => "persisted-fallback",
        };
        f.write_str(name)
    }
}

/// Where discovery stopped and what it found there. `tier == None` means
/// every tier was exhausted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovery {
    pub tier: Option<DiscoveryTier>,
    pub candidates: Vec<QuoteCandidate>,
}

impl Discovery {
    pub fn exhausted() -> Self {
        Self::default()
    }

    pub fn is_exhausted(&self) -> bool {
        self.tier.is_none()
    }

    pub fn best(&self) -> Option<&QuoteCandidate> {
        select_best(&self.candidates)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestQuote {
    Route(ExecutionRoute),
    NoLiquidity,
}

impl BestQuote {
    pub fn route(&self) -> Option<&ExecutionRoute> {
        match self {
            BestQuote::Route(route) => Some(route),
            BestQuote::NoLiquidity => None,
        }
    }

    pub fn is_no_liquidity(&self) -> bool {
        matches!(self, BestQuote::NoLiquidity)
    }
}

#[derive(Debug, Default)]
struct TierOutcome {
    set: CandidateSet,
    store_error: Option<StoreError>,
}

type QuoteCacheKey = (u64, Address, Address, U256);

/// Entry point of the router: owns the provider, the cached metadata store
/// and the short-lived cache of winning quotes.
pub struct QuoteEngine<P, S> {
    provider: P,
    store: CachedMetadataStore<S>,
    config: QuoterConfig,
    quotes: TtlCache<QuoteCacheKey, QuoteCandidate>,
}

impl<P: AmmQueryProvider, S: PoolMetadataStore> QuoteEngine<P, S> {
    pub fn new(provider: P, store: S, config: QuoterConfig) -> Self {
        Self {
            provider,
            store: CachedMetadataStore::new(store, config.metadata_ttl()),
            quotes: TtlCache::new(config.quote_ttl()),
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &CachedMetadataStore<S> {
        &self.store
    }

    pub fn config(&self) -> &QuoterConfig {
        &self.config
    }

    pub fn clear_quote_cache(&self) {
        self.quotes.clear();
    }

    fn generator(&self) -> CandidateGenerator<'_, P> {
        CandidateGenerator::new(&self.provider, &self.config)
    }

    /// Requests with routing hints are never served from the quote cache.
    fn cache_key(request: &QuoteRequest) -> Option<QuoteCacheKey> {
        request.routing_hints.is_none().then(|| {
            (
                request.chain_id,
                request.token_in.address,
                request.token_out.address,
                request.amount_in,
            )
        })
    }

    /// Best executable route for `request`, or `NoLiquidity`.
    ///
    /// Errors only for malformed requests, candidates that break the route
    /// layout, and total outage (providers failing and the metadata store
    /// unreachable).
    pub async fn get_best_quote(&self, request: &QuoteRequest) -> Result<BestQuote, QuoteError> {
        request.validate()?;
        if request.amount_in.is_zero() {
            tracing::debug!(
                token_in = %request.token_in,
                token_out = %request.token_out,
                "zero input amount"
            );
            return Ok(BestQuote::NoLiquidity);
        }

        let cache_key = Self::cache_key(request);
        if let Some(hit) = cache_key.as_ref().and_then(|key| self.quotes.get(key)) {
            tracing::debug!(format = %hit.format, "quote cache hit");
            return Ok(BestQuote::Route(encode_route(&hit, request)?));
        }

        let discovery = self.discover(request).await?;
        let best = match discovery.best() {
            Some(best) => best,
            None => {
                tracing::info!(
                    token_in = %request.token_in,
                    token_out = %request.token_out,
                    amount_in = %request.amount_in,
                    "no liquidity"
                );
                return Ok(BestQuote::NoLiquidity);
            }
        };

        let route = encode_route(best, request)?;
        if let Some(key) = cache_key {
            self.quotes.insert(key, best.clone());
        }
        tracing::info!(
            tier = ?discovery.tier,
            format = %route.format,
            fee_tier = route.fee_tier,
            liquidity = best.liquidity,
            amount_out = %route.expected_amount_out,
            min_amount_out = %route.min_amount_out,
            "selected route"
        );
        Ok(BestQuote::Route(route))
    }

    /// Run the tier walk under the request deadline and report where it
    /// stopped. A deadline hit counts as exhaustion.
    pub async fn discover(&self, request: &QuoteRequest) -> Result<Discovery, QuoteError> {
        request.validate()?;
        if request.amount_in.is_zero() {
            return Ok(Discovery::exhausted());
        }
        let deadline = Instant::now() + self.config.request_deadline();
        match tokio::time::timeout_at(deadline, self.walk_tiers(request, deadline)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    deadline_ms = self.config.request_deadline_ms,
                    token_in = %request.token_in,
                    token_out = %request.token_out,
                    "request deadline reached, abandoning discovery"
                );
                Ok(Discovery::exhausted())
            }
        }
    }

    async fn walk_tiers(
        &self,
        request: &QuoteRequest,
        deadline: Instant,
    ) -> Result<Discovery, QuoteError> {
        let mut provider_failures = 0usize;
        let mut store_error = None;

        for tier in DiscoveryTier::ALL {
            let outcome = self.run_tier(tier, request, deadline).await;
            provider_failures += outcome.set.transient_failures();
            if outcome.store_error.is_some() {
                store_error = outcome.store_error;
            }
            if outcome.set.has_executable() {
                tracing::debug!(
                    %tier,
                    candidates = outcome.set.candidates.len(),
                    "tier produced candidates"
                );
                return Ok(Discovery {
                    tier: Some(tier),
                    candidates: outcome.set.candidates,
                });
            }
            tracing::debug!(%tier, "tier produced nothing, advancing");
        }

        match store_error {
            Some(store) if provider_failures > 0 => {
                tracing::warn!(provider_failures, store = %store, "all quote sources unavailable");
                Err(QuoteError::Unavailable {
                    provider_failures,
                    store,
                })
            }
            _ => Ok(Discovery::exhausted()),
        }
    }

    async fn run_tier(
        &self,
        tier: DiscoveryTier,
        request: &QuoteRequest,
        deadline: Instant,
    ) -> TierOutcome {
        match tier {
            DiscoveryTier::Direct => match SwapPath::direct(&request.token_in, &request.token_out) {
                Ok(path) => self.run_path_tier(tier, &path, request, deadline).await,
                Err(e) => {
                    tracing::debug!(error = %e, "no direct path");
                    TierOutcome::default()
                }
            },
            DiscoveryTier::ViaBridge => {
                let bridge = &self.config.bridge_asset;
                if request.token_in.same_asset(bridge) || request.token_out.same_asset(bridge) {
                    tracing::debug!(%bridge, "endpoint is the bridge asset, skipping bridge tier");
                    return TierOutcome::default();
                }
                match SwapPath::via(&request.token_in, bridge, &request.token_out) {
                    Ok(path) => self.run_path_tier(tier, &path, request, deadline).await,
                    Err(e) => {
                        tracing::debug!(error = %e, "no bridge path");
                        TierOutcome::default()
                    }
                }
            }
            DiscoveryTier::MetadataAssisted => self.metadata_assisted(request).await,
            DiscoveryTier::PersistedFallback => self.persisted_fallback(request).await,
        }
    }

    /// Generate candidates for `path`, regenerating the whole tier while it
    /// yields nothing executable and some provider failure was transient.
    /// Retries stop once a backoff would cut into the time kept back for the
    /// fallback tiers.
    async fn run_path_tier(
        &self,
        tier: DiscoveryTier,
        path: &SwapPath,
        request: &QuoteRequest,
        deadline: Instant,
    ) -> TierOutcome {
        let cutoff = deadline
            .checked_sub(self.config.fallback_reserve())
            .unwrap_or_else(Instant::now);
        let generator = &self.generator();
        let hints = request.routing_hints.as_ref();
        let amount_in = request.amount_in;
        let retry = &self.config.retry;

        let attempt = || async move {
            let set = generator.generate(path, amount_in, hints).await;
            if !set.has_executable() && set.transient_failures() > 0 {
                Err(set)
            } else {
                Ok(set)
            }
        };
        let set = match retry_until(
            retry.max_retries,
            retry.base_delay_ms,
            Some(cutoff),
            |_: &CandidateSet| tier.retries_transient(),
            attempt,
        )
        .await
        {
            Ok(set) => set,
            Err(set) => {
                tracing::warn!(
                    %tier,
                    %path,
                    failures = set.transient_failures(),
                    "transient failures persisted, giving up on tier"
                );
                set
            }
        };
        TierOutcome {
            set,
            store_error: None,
        }
    }

    async fn native_lookup(
        &self,
        token: &Token,
        other: &Token,
    ) -> Result<Option<PoolMetadata>, ProviderError> {
        let lookup = self.provider.native_pool_lookup(token, other);
        tokio::time::timeout(self.config.subquery_timeout(), lookup)
            .await
            .unwrap_or(Err(ProviderError::Timeout))
    }

    /// Ask both tokens for the pool they publish themselves.
    async fn metadata_assisted(&self, request: &QuoteRequest) -> TierOutcome {
        let (token_in, token_out) = (&request.token_in, &request.token_out);
        let (in_lookup, out_lookup) = tokio::join!(
            self.native_lookup(token_in, token_out),
            self.native_lookup(token_out, token_in)
        );

        let mut outcome = TierOutcome::default();
        let mut entries = Vec::new();
        for (owner, lookup) in [(token_in, in_lookup), (token_out, out_lookup)] {
            match lookup {
                Ok(Some(metadata)) => entries.push((owner.clone(), metadata)),
                Ok(None) => tracing::debug!(token = %owner, "no native pool lookup"),
                Err(e) => {
                    if e.is_transient() {
                        tracing::warn!(token = %owner, error = %e, "native pool lookup failed");
                    } else {
                        tracing::debug!(token = %owner, error = %e, "native pool lookup rejected");
                    }
                    outcome.set.failures.push(e);
                }
            }
        }
        if entries.is_empty() {
            return outcome;
        }

        let generated = self
            .generator()
            .generate_from_metadata(
                &entries,
                token_in,
                token_out,
                request.amount_in,
                request.routing_hints.as_ref(),
            )
            .await;
        outcome.set.extend(generated);
        outcome
    }

    /// Persisted pool metadata, `token_out` first, then `token_in`. An
    /// unreachable store ends the tier without a candidate.
    async fn persisted_fallback(&self, request: &QuoteRequest) -> TierOutcome {
        let mut outcome = TierOutcome::default();
        let order = [
            (&request.token_out, &request.token_in),
            (&request.token_in, &request.token_out),
        ];
        for (owner, other) in order {
            match self.store.get_active(&owner.address, request.chain_id).await {
                Ok(Some(metadata)) if metadata.paired_token.same_asset(other) => {
                    outcome.set = self
                        .generator()
                        .generate_from_metadata(
                            &[(owner.clone(), metadata)],
                            &request.token_in,
                            &request.token_out,
                            request.amount_in,
                            request.routing_hints.as_ref(),
                        )
                        .await;
                    return outcome;
                }
                Ok(Some(metadata)) => {
                    tracing::debug!(
                        token = %owner,
                        paired = %metadata.paired_token,
                        "persisted pool pairs elsewhere"
                    );
                }
                Ok(None) => tracing::debug!(token = %owner, "no persisted pool"),
                Err(e) => {
                    tracing::warn!(
                        token = %owner,
                        error = %e,
                        "metadata store unavailable, skipping persisted fallback"
                    );
                    outcome.store_error = Some(e);
                    return outcome;
                }
            }
        }
        outcome
    }
}
