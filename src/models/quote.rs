use alloy_primitives::{Address, Bytes, U256};
use serde::Serialize;

use crate::models::{PoolFormat, Token};

/// One priced candidate route. Created per request and never mutated after
/// construction; `amount_out == 0` is never viable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCandidate {
    pub format: PoolFormat,
    pub amount_out: U256,
    pub liquidity: u128,
    /// Basis points.
    pub fee_tier: Option<u32>,
    pub hook: Option<Address>,
    /// Full hop path. Empty for formats addressed by fee tier and hook.
    pub path: Vec<Token>,
    /// Format-specific pool addressing.
    pub route_data: Bytes,
}

impl QuoteCandidate {
    pub fn constant_product(path: Vec<Token>, amount_out: U256, liquidity: u128) -> Self {
        Self {
            format: PoolFormat::ConstantProduct,
            amount_out,
            liquidity,
            fee_tier: None,
            hook: None,
            path,
            route_data: Bytes::new(),
        }
    }

    pub fn concentrated(fee_tier: u32, amount_out: U256, liquidity: u128) -> Self {
        Self {
            format: PoolFormat::Concentrated,
            amount_out,
            liquidity,
            fee_tier: Some(fee_tier),
            hook: None,
            path: Vec::new(),
            route_data: Bytes::new(),
        }
    }

    pub fn hooked(
        fee_tier: u32,
        hook: Address,
        amount_out: U256,
        liquidity: u128,
        route_data: Bytes,
    ) -> Self {
        Self {
            format: PoolFormat::Hooked,
            amount_out,
            liquidity,
            fee_tier: Some(fee_tier),
            hook: (!hook.is_zero()).then_some(hook),
            path: Vec::new(),
            route_data,
        }
    }

    pub fn is_viable(&self) -> bool {
        !self.amount_out.is_zero()
    }

    /// Multi-hop concentrated quotes carry their hop path for reporting
    /// but have no execution layout: that format executes single pools only.
    pub fn is_executable(&self) -> bool {
        match self.format {
            PoolFormat::Concentrated => self.path.is_empty(),
            _ => true,
        }
    }
}
