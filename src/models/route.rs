use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::models::{PoolFormat, PoolKey, Token};

pub const MAX_SLIPPAGE_BPS: u32 = 10_000;

/// User parameters folded into the execution route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteParams {
    pub slippage_bps: u32,
    pub recipient: Address,
    #[serde(default)]
    pub referral: Option<Address>,
}

impl RouteParams {
    pub fn new(slippage_bps: u32, recipient: Address) -> Self {
        Self {
            slippage_bps,
            recipient,
            referral: None,
        }
    }

    pub fn with_referral(mut self, referral: Address) -> Self {
        self.referral = Some(referral);
        self
    }
}

/// Caller-supplied routing hints for the hooked format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingHints {
    /// One pool key per hop; walked in order instead of the fee-tier sweep.
    #[serde(default)]
    pub hooked_hops: Vec<PoolKey>,
    /// Forwarded verbatim to hook simulations and the execution route.
    #[serde(default)]
    pub hook_data: Option<Bytes>,
}

impl RoutingHints {
    pub fn hook_data(&self) -> Bytes {
        self.hook_data.clone().unwrap_or_default()
    }
}

/// One `get_best_quote` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: U256,
    pub chain_id: u64,
    #[serde(default)]
    pub routing_hints: Option<RoutingHints>,
    pub params: RouteParams,
}

impl QuoteRequest {
    pub fn new(
        token_in: Token,
        token_out: Token,
        amount_in: U256,
        chain_id: u64,
        params: RouteParams,
    ) -> Self {
        Self {
            token_in,
            token_out,
            amount_in,
            chain_id,
            routing_hints: None,
            params,
        }
    }

    pub fn with_hints(mut self, hints: RoutingHints) -> Self {
        self.routing_hints = Some(hints);
        self
    }

    pub fn hook_data(&self) -> Bytes {
        self.routing_hints
            .as_ref()
            .map(RoutingHints::hook_data)
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), QuoteError> {
        if self.token_in.same_asset(&self.token_out) {
            return Err(QuoteError::InvalidRequest(format!(
                "cannot swap {} for itself",
                self.token_in
            )));
        }
        if self.params.slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(QuoteError::InvalidRequest(format!(
                "slippage {} bps exceeds {}",
                self.params.slippage_bps, MAX_SLIPPAGE_BPS
            )));
        }
        let mut hops = self.routing_hints.iter().flat_map(|hints| &hints.hooked_hops);
        if let Some(key) = hops.find(|key| key.fee_tier == 0) {
            return Err(QuoteError::InvalidRequest(format!(
                "hinted pool {}/{} has no fee tier",
                key.currency0, key.currency1
            )));
        }
        Ok(())
    }
}

/// Validated, format-constrained route handed to the signing component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRoute {
    pub token_in: Token,
    pub token_out: Token,
    pub format: PoolFormat,
    pub fee_tier: u32,
    pub path: Vec<Address>,
    pub route_data: Bytes,
    pub hook_data: Bytes,
    pub recipient: Address,
    pub referral: Option<Address>,
    pub amount_in: U256,
    pub expected_amount_out: U256,
    pub min_amount_out: U256,
    pub slippage_bps: u32,
}

impl ExecutionRoute {
    /// Version tag read by the execution layer.
    pub fn version(&self) -> u8 {
        self.format.ordinal()
    }
}

/// `amount * (10000 - slippage_bps) / 10000`, rounded down.
pub fn apply_slippage(amount: U256, slippage_bps: u32) -> U256 {
    let keep = U256::from(MAX_SLIPPAGE_BPS.saturating_sub(slippage_bps));
    match amount.checked_mul(keep) {
        Some(scaled) => scaled / U256::from(MAX_SLIPPAGE_BPS),
        None => amount / U256::from(MAX_SLIPPAGE_BPS) * keep,
    }
}
