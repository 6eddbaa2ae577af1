//! Reserve-based pair pools (x * y = k).

use alloy_primitives::U256;

use super::{AmmQueryProvider, HopQuote};
use crate::error::ProviderError;
use crate::models::{QuoteCandidate, Reserves, SwapPath, Token};
use crate::utils::{isqrt, saturating_u128};

const BPS_DENOMINATOR: u64 = 10_000;

/// Fee-adjusted constant-product output:
///
///   amount_in_with_fee = amount_in * (10000 - fee_bps)
///   amount_out = amount_in_with_fee * reserve_out / (reserve_in * 10000 + amount_in_with_fee)
///
/// Zero when either reserve is empty or the product overflows 256 bits.
pub fn get_amount_out(amount_in: U256, reserves: Reserves, fee_bps: u32) -> U256 {
    if amount_in.is_zero() || reserves.reserve_in.is_zero() || reserves.reserve_out.is_zero() {
        return U256::ZERO;
    }
    let Some(fee_complement) = BPS_DENOMINATOR.checked_sub(u64::from(fee_bps)) else {
        return U256::ZERO;
    };

    let amount_in_with_fee = match amount_in.checked_mul(U256::from(fee_complement)) {
        Some(v) => v,
        None => return U256::ZERO,
    };
    let numerator = match amount_in_with_fee.checked_mul(reserves.reserve_out) {
        Some(v) => v,
        None => return U256::ZERO,
    };
    let denominator = match reserves
        .reserve_in
        .checked_mul(U256::from(BPS_DENOMINATOR))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
    {
        Some(v) if !v.is_zero() => v,
        _ => return U256::ZERO,
    };

    numerator / denominator
}

/// Geometric-mean depth of the pair, `floor(sqrt(reserve_in * reserve_out))`.
pub fn pair_liquidity(reserves: Reserves) -> u128 {
    match reserves.reserve_in.checked_mul(reserves.reserve_out) {
        Some(k) => saturating_u128(isqrt(k)),
        None => u128::MAX,
    }
}

pub async fn quote_hop<P: AmmQueryProvider + ?Sized>(
    provider: &P,
    token_in: &Token,
    token_out: &Token,
    amount_in: U256,
    fee_bps: u32,
) -> Result<Option<HopQuote>, ProviderError> {
    let reserves = match provider.pair_reserves(token_in, token_out).await? {
        Some(r) => r,
        None => {
            tracing::debug!(%token_in, %token_out, "no constant-product pair");
            return Ok(None);
        }
    };
    let amount_out = get_amount_out(amount_in, reserves, fee_bps);
    if amount_out.is_zero() {
        tracing::debug!(%token_in, %token_out, "constant-product hop not viable");
        return Ok(None);
    }
    Ok(Some(HopQuote {
        amount_out,
        liquidity: pair_liquidity(reserves),
    }))
}

/// Walk the path hop by hop, feeding each output into the next hop. Any
/// non-viable hop aborts the whole candidate.
pub async fn quote_path<P: AmmQueryProvider + ?Sized>(
    provider: &P,
    path: &SwapPath,
    amount_in: U256,
    fee_bps: u32,
) -> Result<Option<QuoteCandidate>, ProviderError> {
    let mut amount = amount_in;
    let mut liquidity = u128::MAX;
    for (token_in, token_out) in path.hops() {
        match quote_hop(provider, token_in, token_out, amount, fee_bps).await? {
            Some(hop) => {
                amount = hop.amount_out;
                liquidity = liquidity.min(hop.liquidity);
            }
            None => return Ok(None),
        }
    }
    Ok(Some(QuoteCandidate::constant_product(
        path.tokens().to_vec(),
        amount,
        liquidity,
    )))
}
