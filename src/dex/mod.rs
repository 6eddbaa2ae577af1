use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::config::QuoterConfig;
use crate::error::ProviderError;
use crate::models::{
    PoolFormat, PoolKey, PoolLiquidity, PoolMetadata, QuoteCandidate, Reserves, SwapPath, Token,
};

pub mod concentrated;
pub mod constant_product;
pub mod hooked;

/// Single-pool exact-input simulation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    pub format: PoolFormat,
    pub pool_key: PoolKey,
    pub zero_for_one: bool,
    pub amount_in: U256,
    /// `None` lets the provider use the extreme bound for the direction.
    pub sqrt_price_limit_x96: Option<U256>,
    pub hook_data: Bytes,
}

/// Live pool state and simulation backend.
#[async_trait]
pub trait AmmQueryProvider: Send + Sync {
    fn identifier(&self) -> &str;

    /// Constant-product reserves for the pair, oriented `token_in -> token_out`.
    async fn pair_reserves(
        &self,
        token_in: &Token,
        token_out: &Token,
    ) -> Result<Option<Reserves>, ProviderError>;

    async fn pool_liquidity(
        &self,
        format: PoolFormat,
        key: &PoolKey,
    ) -> Result<Option<PoolLiquidity>, ProviderError>;

    /// Output amount of an exact-input swap against one pool.
    async fn simulate(&self, request: &SimulationRequest) -> Result<U256, ProviderError>;

    /// Pool configuration published by `token_a` itself for its pair with
    /// `token_b`. Most tokens do not expose one.
    async fn native_pool_lookup(
        &self,
        _token_a: &Token,
        _token_b: &Token,
    ) -> Result<Option<PoolMetadata>, ProviderError> {
        Ok(None)
    }
}

/// Output and depth of one priced hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopQuote {
    pub amount_out: U256,
    pub liquidity: u128,
}

/// Price `amount_in` along `path` for one format. `Ok(None)` means not viable.
///
/// Concentrated and hooked pools need a `fee_tier`; the hooked format only
/// prices direct pairs here (hinted multi-hop walks go through
/// [`hooked::quote_hinted_path`]).
pub async fn evaluate_path<P: AmmQueryProvider + ?Sized>(
    provider: &P,
    path: &SwapPath,
    amount_in: U256,
    format: PoolFormat,
    fee_tier: Option<u32>,
    config: &QuoterConfig,
    hook_data: &Bytes,
) -> Result<Option<QuoteCandidate>, ProviderError> {
    if amount_in.is_zero() {
        return Ok(None);
    }
    match format {
        PoolFormat::ConstantProduct => {
            let fee_bps = config.constant_product_fee_bps;
            constant_product::quote_path(provider, path, amount_in, fee_bps).await
        }
        PoolFormat::Concentrated => {
            let fee_tier = fee_tier.ok_or_else(|| {
                ProviderError::Malformed("concentrated quote requires a fee tier".to_string())
            })?;
            let limit_bps = config.price_limit_bps;
            concentrated::quote_path(provider, path, amount_in, fee_tier, limit_bps).await
        }
        PoolFormat::Hooked => {
            let fee_tier = fee_tier.ok_or_else(|| {
                ProviderError::Malformed("hooked quote requires a fee tier".to_string())
            })?;
            if !path.is_direct() {
                return Err(ProviderError::Malformed(format!(
                    "hooked pools are looked up by pair, got {} hops",
                    path.hop_count()
                )));
            }
            let (token_in, token_out) = (path.token_in(), path.token_out());
            let key = PoolKey::standard(token_in.address, token_out.address, fee_tier);
            hooked::quote_pool(provider, &key, &token_in.address, amount_in, hook_data).await
        }
    }
}

pub(crate) fn zero_for_one(token_in: &Address, token_out: &Address) -> bool {
    token_in < token_out
}
