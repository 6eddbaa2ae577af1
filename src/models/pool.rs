use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::models::Token;

/// Size of one ABI-encoded pool key: five 32-byte words.
pub const POOL_KEY_ENCODED_LEN: usize = 160;

/// Standard tick spacing for a fee tier expressed in basis points.
pub fn tick_spacing_for_fee(fee_tier_bps: u32) -> i32 {
    match fee_tier_bps {
        1 => 1,
        5 => 10,
        30 => 60,
        100 => 200,
        _ => 60,
    }
}

/// Addressing for a concentrated-liquidity pool. Currencies are stored
/// sorted by address, as the pool manager keys them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    /// Basis points.
    pub fee_tier: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
}

impl PoolKey {
    pub fn new(
        token_a: Address,
        token_b: Address,
        fee_tier: u32,
        tick_spacing: i32,
        hooks: Address,
    ) -> Self {
        let (currency0, currency1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Self {
            currency0,
            currency1,
            fee_tier,
            tick_spacing,
            hooks,
        }
    }

    /// Hook-less key using the standard spacing for `fee_tier`.
    pub fn standard(token_a: Address, token_b: Address, fee_tier: u32) -> Self {
        Self::new(token_a, token_b, fee_tier, tick_spacing_for_fee(fee_tier), Address::ZERO)
    }

    pub fn has_hook(&self) -> bool {
        !self.hooks.is_zero()
    }

    pub fn contains(&self, token: &Address) -> bool {
        self.currency0 == *token || self.currency1 == *token
    }

    pub fn zero_for_one(&self, token_in: &Address) -> bool {
        self.currency0 == *token_in
    }

    /// ABI word layout: currency0, currency1, fee (hundredths of a bip),
    /// tickSpacing (sign-extended), hooks.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(POOL_KEY_ENCODED_LEN);
        out.extend_from_slice(self.currency0.into_word().as_slice());
        out.extend_from_slice(self.currency1.into_word().as_slice());
        out.extend_from_slice(&U256::from(u64::from(self.fee_tier) * 100).to_be_bytes::<32>());
        let mut spacing = if self.tick_spacing < 0 { [0xffu8; 32] } else { [0u8; 32] };
        spacing[28..].copy_from_slice(&self.tick_spacing.to_be_bytes());
        out.extend_from_slice(&spacing);
        out.extend_from_slice(self.hooks.into_word().as_slice());
        out
    }

    /// Decode one key per 160-byte chunk. Returns `None` on a ragged blob.
    pub fn decode_all(data: &[u8]) -> Option<Vec<PoolKey>> {
        if data.is_empty() || data.len() % POOL_KEY_ENCODED_LEN != 0 {
            return None;
        }
        data.chunks(POOL_KEY_ENCODED_LEN)
            .map(|chunk| {
                let word = |i: usize| &chunk[i * 32..(i + 1) * 32];
                let fee_pips = U256::from_be_slice(word(2));
                let fee_tier = u32::try_from(fee_pips / U256::from(100u64)).ok()?;
                let mut spacing = [0u8; 4];
                spacing.copy_from_slice(&word(3)[28..]);
                Some(PoolKey {
                    currency0: Address::from_slice(&word(0)[12..]),
                    currency1: Address::from_slice(&word(1)[12..]),
                    fee_tier,
                    tick_spacing: i32::from_be_bytes(spacing),
                    hooks: Address::from_slice(&word(4)[12..]),
                })
            })
            .collect()
    }
}

/// Concatenate the encoded keys of a multi-hop route.
pub fn encode_pool_keys(keys: &[PoolKey]) -> Bytes {
    let mut out = Vec::with_capacity(keys.len() * POOL_KEY_ENCODED_LEN);
    for key in keys {
        out.extend_from_slice(&key.encode());
    }
    Bytes::from(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Registered by the token's deployer at launch.
    Deployer,
    /// Discovered by the chain indexer.
    Indexer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    Active,
    Pending,
    Error,
}

/// Known pool configuration for a token, as recorded by the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetadata {
    pub paired_token: Token,
    pub fee_tier: u32,
    pub tick_spacing: i32,
    /// Zero address means no hook.
    #[serde(default)]
    pub hook: Address,
    pub provenance: Provenance,
    pub status: PoolStatus,
}

impl PoolMetadata {
    pub fn is_active(&self) -> bool {
        self.status == PoolStatus::Active
    }

    pub fn has_hook(&self) -> bool {
        !self.hook.is_zero()
    }

    /// Exact pool addressing for `token` against the recorded paired token.
    pub fn pool_key(&self, token: &Address) -> PoolKey {
        PoolKey::new(*token, self.paired_token.address, self.fee_tier, self.tick_spacing, self.hook)
    }
}

/// Constant-product reserves oriented in swap direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub reserve_in: U256,
    pub reserve_out: U256,
}

impl Reserves {
    pub fn new(reserve_in: U256, reserve_out: U256) -> Self {
        Self {
            reserve_in,
            reserve_out,
        }
    }
}

/// Live state of a concentrated-liquidity pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLiquidity {
    pub liquidity: u128,
    pub sqrt_price_x96: U256,
}
