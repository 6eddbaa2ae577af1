//! Fee-tiered concentrated-liquidity pools priced through the provider's
//! quoter, with a bounded price limit.

use alloy_primitives::{uint, Bytes, U256};

use super::{zero_for_one, AmmQueryProvider, HopQuote, SimulationRequest};
use crate::error::ProviderError;
use crate::models::{PoolFormat, PoolKey, QuoteCandidate, SwapPath, Token};
use crate::utils::isqrt;

/// Lowest sqrt ratio a pool can reach (tick -887272).
pub const MIN_SQRT_RATIO: U256 = uint!(4295128739_U256);
/// Highest sqrt ratio a pool can reach (tick 887272).
pub const MAX_SQRT_RATIO: U256 = uint!(1461446703485210103287273052203988822378723970342_U256);

const LIMIT_SCALE: u64 = 1_000_000_000_000;

/// Price limit `limit_bps` away from the current price in the swap
/// direction. Works on the square root: the limit price is
/// `price * (10000 -/+ limit_bps) / 10000`, so the sqrt moves by the square
/// root of that factor. Clamped strictly inside the pool's range.
pub fn sqrt_price_limit(sqrt_price_x96: U256, zero_for_one: bool, limit_bps: u32) -> U256 {
    let bps = u64::from(limit_bps.min(10_000));
    let factor_bps = if zero_for_one { 10_000 - bps } else { 10_000 + bps };
    // sqrt(factor_bps / 10000) scaled by 1e12 == sqrt(factor_bps * 1e20)
    let factor = isqrt(U256::from(factor_bps) * U256::from(100_000_000_000_000_000_000u128));
    let limit = sqrt_price_x96
        .checked_mul(factor)
        .map(|v| v / U256::from(LIMIT_SCALE))
        .unwrap_or(MAX_SQRT_RATIO);

    let floor = MIN_SQRT_RATIO + U256::from(1u64);
    let ceiling = MAX_SQRT_RATIO - U256::from(1u64);
    limit.clamp(floor, ceiling)
}

/// Price one hop through the standard hook-less pool at `fee_tier`.
pub async fn quote_hop<P: AmmQueryProvider + ?Sized>(
    provider: &P,
    token_in: &Token,
    token_out: &Token,
    amount_in: U256,
    fee_tier: u32,
    limit_bps: u32,
) -> Result<Option<HopQuote>, ProviderError> {
    let key = PoolKey::standard(token_in.address, token_out.address, fee_tier);
    let state = match provider.pool_liquidity(PoolFormat::Concentrated, &key).await? {
        Some(state) if state.liquidity > 0 => state,
        _ => {
            tracing::debug!(%token_in, %token_out, fee_tier, "concentrated pool empty or missing");
            return Ok(None);
        }
    };

    let direction = zero_for_one(&token_in.address, &token_out.address);
    let request = SimulationRequest {
        format: PoolFormat::Concentrated,
        pool_key: key,
        zero_for_one: direction,
        amount_in,
        sqrt_price_limit_x96: Some(sqrt_price_limit(state.sqrt_price_x96, direction, limit_bps)),
        hook_data: Bytes::new(),
    };
    let amount_out = provider.simulate(&request).await?;
    if amount_out.is_zero() {
        return Ok(None);
    }
    Ok(Some(HopQuote {
        amount_out,
        liquidity: state.liquidity,
    }))
}

/// Apply one fee tier uniformly across every hop. Direct candidates are
/// addressed by fee tier alone; multi-hop candidates keep their path.
pub async fn quote_path<P: AmmQueryProvider + ?Sized>(
    provider: &P,
    path: &SwapPath,
    amount_in: U256,
    fee_tier: u32,
    limit_bps: u32,
) -> Result<Option<QuoteCandidate>, ProviderError> {
    let mut amount = amount_in;
    let mut liquidity = u128::MAX;
    for (token_in, token_out) in path.hops() {
        match quote_hop(provider, token_in, token_out, amount, fee_tier, limit_bps).await? {
            Some(hop) => {
                amount = hop.amount_out;
                liquidity = liquidity.min(hop.liquidity);
            }
            None => return Ok(None),
        }
    }

    let mut candidate = QuoteCandidate::concentrated(fee_tier, amount, liquidity);
    if !path.is_direct() {
        candidate.path = path.tokens().to_vec();
    }
    Ok(Some(candidate))
}
