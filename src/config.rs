//! Router configuration.

use alloy_primitives::address;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::load_from_file;
use crate::models::Token;

pub const DEFAULT_FEE_TIERS_BPS: [u32; 4] = [1, 5, 30, 100];

/// Retry policy for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoterConfig {
    /// Intermediate asset for two-hop routes.
    #[serde(default = "default_bridge_asset")]
    pub bridge_asset: Token,

    /// Fee tiers (bps) swept for concentrated and hooked pools.
    #[serde(default = "default_fee_tiers")]
    pub fee_tiers_bps: Vec<u32>,

    /// Constant-product pool fee (bps).
    #[serde(default = "default_constant_product_fee")]
    pub constant_product_fee_bps: u32,

    /// Simulation price bound, in bps of the current price.
    #[serde(default = "default_price_limit")]
    pub price_limit_bps: u32,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default = "default_request_deadline")]
    pub request_deadline_ms: u64,

    #[serde(default = "default_subquery_timeout")]
    pub subquery_timeout_ms: u64,

    /// Time kept back for the fallback tiers; path tiers stop retrying once
    /// a backoff would eat into it.
    #[serde(default = "default_fallback_reserve")]
    pub fallback_reserve_ms: u64,

    #[serde(default = "default_metadata_ttl")]
    pub metadata_ttl_secs: u64,

    #[serde(default = "default_quote_ttl")]
    pub quote_ttl_secs: u64,
}

fn default_bridge_asset() -> Token {
    Token::new(address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), 18, "WETH")
}

fn default_fee_tiers() -> Vec<u32> {
    DEFAULT_FEE_TIERS_BPS.to_vec()
}

fn default_constant_product_fee() -> u32 {
    30
}

fn default_price_limit() -> u32 {
    500
}

fn default_request_deadline() -> u64 {
    5_000
}

fn default_subquery_timeout() -> u64 {
    2_000
}

fn default_fallback_reserve() -> u64 {
    1_000
}

fn default_metadata_ttl() -> u64 {
    300
}

fn default_quote_ttl() -> u64 {
    60
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            bridge_asset: default_bridge_asset(),
            fee_tiers_bps: default_fee_tiers(),
            constant_product_fee_bps: default_constant_product_fee(),
            price_limit_bps: default_price_limit(),
            retry: RetryConfig::default(),
            request_deadline_ms: default_request_deadline(),
            subquery_timeout_ms: default_subquery_timeout(),
            fallback_reserve_ms: default_fallback_reserve(),
            metadata_ttl_secs: default_metadata_ttl(),
            quote_ttl_secs: default_quote_ttl(),
        }
    }
}

impl QuoterConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        load_from_file(path)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    pub fn subquery_timeout(&self) -> Duration {
        Duration::from_millis(self.subquery_timeout_ms)
    }

    pub fn fallback_reserve(&self) -> Duration {
        Duration::from_millis(self.fallback_reserve_ms)
    }

    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_ttl_secs)
    }

    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_ttl_secs)
    }
}
