//! Candidate generation: fans one swap path out into per-format, per-tier
//! sub-queries, runs them concurrently and keeps every viable result.

use alloy_primitives::{Bytes, U256};
use futures::future::join_all;
use std::fmt;
use std::future::Future;

use crate::config::QuoterConfig;
use crate::dex::{evaluate_path, hooked, AmmQueryProvider};
use crate::error::ProviderError;
use crate::models::{
    PoolFormat, PoolKey, PoolMetadata, QuoteCandidate, RoutingHints, SwapPath, Token,
};

/// Viable candidates of one generation round, in evaluation order, plus the
/// provider failures met along the way.
#[derive(Debug, Default)]
pub struct CandidateSet {
    pub candidates: Vec<QuoteCandidate>,
    pub failures: Vec<ProviderError>,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether anything in the set can go to the encoder.
    pub fn has_executable(&self) -> bool {
        self.candidates.iter().any(QuoteCandidate::is_executable)
    }

    pub fn transient_failures(&self) -> usize {
        self.failures.iter().filter(|e| e.is_transient()).count()
    }

    pub fn extend(&mut self, other: CandidateSet) {
        self.candidates.extend(other.candidates);
        self.failures.extend(other.failures);
    }

    fn record(&mut self, label: &str, result: Result<Option<QuoteCandidate>, ProviderError>) {
        match result {
            Ok(Some(candidate)) if candidate.is_viable() => self.candidates.push(candidate),
            Ok(_) => tracing::debug!(query = label, "not viable"),
            Err(e) if e.is_transient() => {
                tracing::warn!(query = label, error = %e, "transient provider failure");
                self.failures.push(e);
            }
            Err(e) => {
                tracing::debug!(query = label, error = %e, "provider rejected query");
                self.failures.push(e);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SubQuery<'h> {
    ConstantProduct,
    Concentrated(u32),
    Hooked(u32),
    HookedHinted(&'h [PoolKey]),
}

impl fmt::Display for SubQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubQuery::ConstantProduct => write!(f, "{}", PoolFormat::ConstantProduct),
            SubQuery::Concentrated(tier) => write!(f, "{}@{}bps", PoolFormat::Concentrated, tier),
            SubQuery::Hooked(tier) => write!(f, "{}@{}bps", PoolFormat::Hooked, tier),
            SubQuery::HookedHinted(keys) => {
                write!(f, "{}/hinted[{}]", PoolFormat::Hooked, keys.len())
            }
        }
    }
}

pub struct CandidateGenerator<'a, P: ?Sized> {
    provider: &'a P,
    config: &'a QuoterConfig,
}

impl<'a, P: AmmQueryProvider + ?Sized> CandidateGenerator<'a, P> {
    pub fn new(provider: &'a P, config: &'a QuoterConfig) -> Self {
        Self { provider, config }
    }

    /// Evaluation order for one path: constant product, then the
    /// concentrated fee-tier sweep, then hooked pools (hinted walk when hints
    /// match the path length, fee-tier sweep on direct paths otherwise).
    fn plan<'h>(&self, path: &SwapPath, hints: Option<&'h RoutingHints>) -> Vec<SubQuery<'h>> {
        let mut queries = vec![SubQuery::ConstantProduct];
        let tiers = &self.config.fee_tiers_bps;
        queries.extend(tiers.iter().map(|tier| SubQuery::Concentrated(*tier)));

        match hints.map(|h| h.hooked_hops.as_slice()).filter(|keys| !keys.is_empty()) {
            Some(keys) if keys.len() == path.hop_count() => {
                queries.push(SubQuery::HookedHinted(keys))
            }
            Some(keys) => {
                tracing::debug!(
                    %path,
                    hints = keys.len(),
                    "routing hints do not fit path, skipping hooked pools"
                );
            }
            None if path.is_direct() => {
                queries.extend(tiers.iter().map(|tier| SubQuery::Hooked(*tier)));
            }
            None => {}
        }
        queries
    }

    async fn run(
        &self,
        path: &SwapPath,
        amount_in: U256,
        query: SubQuery<'_>,
        hook_data: &Bytes,
    ) -> Result<Option<QuoteCandidate>, ProviderError> {
        let provider = self.provider;
        let config = self.config;
        match query {
            SubQuery::ConstantProduct => {
                self.timed(evaluate_path(
                    provider,
                    path,
                    amount_in,
                    PoolFormat::ConstantProduct,
                    None,
                    config,
                    hook_data,
                ))
                .await
            }
            SubQuery::Concentrated(tier) => {
                self.timed(evaluate_path(
                    provider,
                    path,
                    amount_in,
                    PoolFormat::Concentrated,
                    Some(tier),
                    config,
                    hook_data,
                ))
                .await
            }
            SubQuery::Hooked(tier) => {
                self.timed(evaluate_path(
                    provider,
                    path,
                    amount_in,
                    PoolFormat::Hooked,
                    Some(tier),
                    config,
                    hook_data,
                ))
                .await
            }
            SubQuery::HookedHinted(keys) => {
                self.timed(hooked::quote_hinted_path(provider, path, keys, amount_in, hook_data))
                    .await
            }
        }
    }

    async fn timed<F>(&self, query: F) -> Result<Option<QuoteCandidate>, ProviderError>
    where
        F: Future<Output = Result<Option<QuoteCandidate>, ProviderError>>,
    {
        tokio::time::timeout(self.config.subquery_timeout(), query)
            .await
            .unwrap_or(Err(ProviderError::Timeout))
    }

    /// Every viable candidate for `path`, in evaluation order.
    pub async fn generate(
        &self,
        path: &SwapPath,
        amount_in: U256,
        hints: Option<&RoutingHints>,
    ) -> CandidateSet {
        let mut set = CandidateSet::default();
        if amount_in.is_zero() {
            return set;
        }
        let hook_data = hints.map(RoutingHints::hook_data).unwrap_or_default();
        let queries = self.plan(path, hints);

        let results = join_all(
            queries
                .iter()
                .map(|query| self.run(path, amount_in, *query, &hook_data)),
        )
        .await;
        for (query, result) in queries.iter().zip(results) {
            set.record(&format!("{} {}", path, query), result);
        }
        tracing::debug!(
            %path,
            queries = queries.len(),
            viable = set.candidates.len(),
            "generated candidates"
        );
        set
    }

    /// Price the exact pools recorded in `entries`, each given as the token
    /// the metadata belongs to. Entries that are inactive or not paired with
    /// the other side of the swap are skipped.
    pub async fn generate_from_metadata(
        &self,
        entries: &[(Token, PoolMetadata)],
        token_in: &Token,
        token_out: &Token,
        amount_in: U256,
        hints: Option<&RoutingHints>,
    ) -> CandidateSet {
        let mut set = CandidateSet::default();
        if amount_in.is_zero() {
            return set;
        }
        let hook_data = hints.map(RoutingHints::hook_data).unwrap_or_default();
        let usable: Vec<PoolKey> = entries
            .iter()
            .filter_map(|(owner, metadata)| {
                let other = if owner.same_asset(token_in) { token_out } else { token_in };
                let usable = metadata.is_active()
                    && metadata.fee_tier > 0
                    && metadata.paired_token.same_asset(other);
                if !usable {
                    tracing::debug!(
                        token = %owner,
                        paired = %metadata.paired_token,
                        status = ?metadata.status,
                        fee_tier = metadata.fee_tier,
                        "pool metadata unusable for this pair"
                    );
                    return None;
                }
                Some(metadata.pool_key(&owner.address))
            })
            .collect();

        let results = join_all(usable.iter().map(|key| {
            self.timed(hooked::quote_pool(
                self.provider,
                key,
                &token_in.address,
                amount_in,
                &hook_data,
            ))
        }))
        .await;
        for (key, result) in usable.iter().zip(results) {
            let label = format!("{} pool {}@{}bps", PoolFormat::Hooked, key.hooks, key.fee_tier);
            set.record(&label, result);
        }
        set
    }
}
