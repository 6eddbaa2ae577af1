//! Concentrated pools with pluggable hooks. Quotes are gated on live
//! liquidity, and a hook refusing to price the swap is not viable rather
//! than an error.

use alloy_primitives::{Address, Bytes, U256};

use super::{AmmQueryProvider, HopQuote, SimulationRequest};
use crate::error::ProviderError;
use crate::models::{encode_pool_keys, PoolFormat, PoolKey, QuoteCandidate, SwapPath};

pub async fn quote_hop<P: AmmQueryProvider + ?Sized>(
    provider: &P,
    key: &PoolKey,
    token_in: &Address,
    amount_in: U256,
    hook_data: &Bytes,
) -> Result<Option<HopQuote>, ProviderError> {
    let liquidity = match provider.pool_liquidity(PoolFormat::Hooked, key).await? {
        Some(state) if state.liquidity > 0 => state.liquidity,
        _ => {
            tracing::debug!(
                fee_tier = key.fee_tier,
                hooks = %key.hooks,
                "hooked pool empty or missing"
            );
            return Ok(None);
        }
    };

    let request = SimulationRequest {
        format: PoolFormat::Hooked,
        pool_key: key.clone(),
        zero_for_one: key.zero_for_one(token_in),
        amount_in,
        sqrt_price_limit_x96: None,
        hook_data: hook_data.clone(),
    };
    match provider.simulate(&request).await {
        Ok(amount_out) if !amount_out.is_zero() => Ok(Some(HopQuote {
            amount_out,
            liquidity,
        })),
        Ok(_) => Ok(None),
        Err(e) if e.is_hook_declined() => {
            tracing::debug!(hooks = %key.hooks, error = %e, "hook declined to quote");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Price a single hooked pool as a direct candidate.
pub async fn quote_pool<P: AmmQueryProvider + ?Sized>(
    provider: &P,
    key: &PoolKey,
    token_in: &Address,
    amount_in: U256,
    hook_data: &Bytes,
) -> Result<Option<QuoteCandidate>, ProviderError> {
    if !key.contains(token_in) {
        return Err(ProviderError::Malformed(format!(
            "pool key does not contain input token {}",
            token_in
        )));
    }
    let hop = match quote_hop(provider, key, token_in, amount_in, hook_data).await? {
        Some(hop) => hop,
        None => return Ok(None),
    };
    Ok(Some(QuoteCandidate::hooked(
        key.fee_tier,
        key.hooks,
        hop.amount_out,
        hop.liquidity,
        Bytes::from(key.encode()),
    )))
}

/// Walk caller-supplied pool keys hop by hop, one key per hop of `path`.
/// The route data carries every hop's key in order.
pub async fn quote_hinted_path<P: AmmQueryProvider + ?Sized>(
    provider: &P,
    path: &SwapPath,
    keys: &[PoolKey],
    amount_in: U256,
    hook_data: &Bytes,
) -> Result<Option<QuoteCandidate>, ProviderError> {
    if keys.len() != path.hop_count() {
        return Err(ProviderError::Malformed(format!(
            "{} routing hints for {} hops",
            keys.len(),
            path.hop_count()
        )));
    }
    if let Some(index) = path
        .hops()
        .zip(keys)
        .position(|((token_in, token_out), key)| {
            !key.contains(&token_in.address) || !key.contains(&token_out.address)
        })
    {
        return Err(ProviderError::Malformed(format!(
            "routing hint {} does not match hop {} -> {}",
            index,
            path.tokens()[index],
            path.tokens()[index + 1]
        )));
    }

    let mut amount = amount_in;
    let mut liquidity = u128::MAX;
    for ((token_in, _), key) in path.hops().zip(keys) {
        match quote_hop(provider, key, &token_in.address, amount, hook_data).await? {
            Some(hop) => {
                amount = hop.amount_out;
                liquidity = liquidity.min(hop.liquidity);
            }
            None => return Ok(None),
        }
    }

    let hook = keys
        .iter()
        .map(|key| key.hooks)
        .find(|hooks| !hooks.is_zero())
        .unwrap_or(Address::ZERO);
    Ok(Some(QuoteCandidate::hooked(
        keys[0].fee_tier,
        hook,
        amount,
        liquidity,
        encode_pool_keys(keys),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{token, MockProvider, MockQuote};

    fn hooked_key(fee_tier: u32, hook: u8) -> PoolKey {
        let (a, b) = (token(1, "A"), token(2, "B"));
        PoolKey::new(a.address, b.address, fee_tier, 60, Address::with_last_byte(hook))
    }

    #[tokio::test]
    async fn test_zero_liquidity_skips_simulation() {
        let key = hooked_key(30, 0xaa);
        let provider = MockProvider::new().with_pool(
            PoolFormat::Hooked,
            key.clone(),
            0,
            MockQuote::Fixed(U256::from(500u64)),
        );
        let quote = quote_pool(
            &provider,
            &key,
            &token(1, "A").address,
            U256::from(100u64),
            &Bytes::new(),
        )
        .await
        .unwrap();
        assert!(quote.is_none());
        assert!(provider.simulations().is_empty());
    }

    #[tokio::test]
    async fn test_hook_declined_is_not_viable() {
        let key = hooked_key(30, 0xaa);
        let provider = MockProvider::new().with_pool(
            PoolFormat::Hooked,
            key.clone(),
            1_000,
            MockQuote::Fail(ProviderError::Reverted { code: "HookNotImplemented".into() }),
        );
        let quote = quote_pool(
            &provider,
            &key,
            &token(1, "A").address,
            U256::from(100u64),
            &Bytes::new(),
        )
        .await
        .unwrap();
        assert!(quote.is_none());
    }

    #[tokio::test]
    async fn test_other_reverts_propagate() {
        let key = hooked_key(30, 0xaa);
        let provider = MockProvider::new().with_pool(
            PoolFormat::Hooked,
            key.clone(),
            1_000,
            MockQuote::Fail(ProviderError::Timeout),
        );
        let err = quote_pool(
            &provider,
            &key,
            &token(1, "A").address,
            U256::from(100u64),
            &Bytes::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, ProviderError::Timeout);
    }

    #[tokio::test]
    async fn test_hook_data_forwarded_and_route_data_encoded() {
        let key = hooked_key(100, 0xaa);
        let provider = MockProvider::new().with_pool(
            PoolFormat::Hooked,
            key.clone(),
            1_000,
            MockQuote::Fixed(U256::from(42u64)),
        );
        let hook_data = Bytes::from(vec![0xde, 0xad]);
        let candidate = quote_pool(
            &provider,
            &key,
            &token(2, "B").address,
            U256::from(100u64),
            &hook_data,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(candidate.format, PoolFormat::Hooked);
        assert_eq!(candidate.hook, Some(Address::with_last_byte(0xaa)));
        assert!(candidate.path.is_empty());
        assert_eq!(PoolKey::decode_all(&candidate.route_data).unwrap(), vec![key]);

        let sims = provider.simulations();
        assert_eq!(sims.len(), 1);
        assert_eq!(sims[0].hook_data, hook_data);
        assert!(sims[0].sqrt_price_limit_x96.is_none());
        // token 2 is currency1, so the swap is one-for-zero
        assert!(!sims[0].zero_for_one);
    }

    #[tokio::test]
    async fn test_hinted_path_walks_each_key() {
        let (a, b, c) = (token(1, "A"), token(2, "B"), token(3, "C"));
        let first = PoolKey::new(a.address, b.address, 30, 60, Address::ZERO);
        let second = PoolKey::new(b.address, c.address, 100, 200, Address::with_last_byte(0xbb));
        let provider = MockProvider::new()
            .with_pool(PoolFormat::Hooked, first.clone(), 5_000, MockQuote::Ratio(2, 1))
            .with_pool(PoolFormat::Hooked, second.clone(), 700, MockQuote::Ratio(1, 4));
        let path = SwapPath::new(vec![a.clone(), b.clone(), c.clone()]).unwrap();

        let candidate = quote_hinted_path(
            &provider,
            &path,
            &[first.clone(), second.clone()],
            U256::from(1_000u64),
            &Bytes::new(),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(candidate.amount_out, U256::from(500u64));
        assert_eq!(candidate.liquidity, 700);
        assert_eq!(candidate.fee_tier, Some(30));
        assert_eq!(candidate.hook, Some(Address::with_last_byte(0xbb)));
        assert!(candidate.path.is_empty());
        assert_eq!(PoolKey::decode_all(&candidate.route_data).unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_hinted_path_rejects_mismatched_hints() {
        let (a, b, c) = (token(1, "A"), token(2, "B"), token(3, "C"));
        let path = SwapPath::new(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        let wrong = PoolKey::standard(a.address, c.address, 30);
        let provider = MockProvider::new();

        let err = quote_hinted_path(
            &provider,
            &path,
            &[wrong.clone()],
            U256::from(1u64),
            &Bytes::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));

        let err = quote_hinted_path(
            &provider,
            &path,
            &[wrong.clone(), wrong],
            U256::from(1u64),
            &Bytes::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }
}
