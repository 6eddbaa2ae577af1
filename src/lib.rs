//! # swap-router-rs
//!
//! A Rust library for best-price route discovery across several AMM pool formats.
//! Prices candidate paths through a pluggable query provider, falls back through
//! progressively more expensive discovery tiers, and encodes the winner for execution.
//!
//! ## Supported Pool Formats
//!
//! | Format | Version | Pricing | Addressing |
//! |--------|---------|---------|------------|
//! | ConstantProduct | 2 | Reserves, fixed fee | Full hop path |
//! | Concentrated | 3 | Provider simulation, 5% price limit | Fee tier |
//! | Hooked | 4 | Liquidity-gated simulation, hook data | Fee tier + encoded pool keys |
//!
//! ## Discovery Tiers
//!
//! | Tier | Source |
//! |------|--------|
//! | Direct | `[token_in, token_out]` |
//! | ViaBridge | `[token_in, bridge, token_out]` |
//! | MetadataAssisted | Pool published by the token itself |
//! | PersistedFallback | Metadata store (cache-through) |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use swap_router_rs::{QuoteEngine, QuoterConfig, QuoteRequest, RouteParams, BestQuote};
//! use swap_router_rs::store::HttpMetadataStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // `provider` is any `AmmQueryProvider` (RPC-backed in production)
//!     let store = HttpMetadataStore::new("http://metadata.internal:8080");
//!     let engine = QuoteEngine::new(provider, store, QuoterConfig::default());
//!
//!     let request = QuoteRequest::new(usdc, weth, amount_in, 1, RouteParams::new(50, recipient));
//!     match engine.get_best_quote(&request).await? {
//!         BestQuote::Route(route) => {
//!             println!("v{} route, min out {}", route.version(), route.min_amount_out)
//!         }
//!         BestQuote::NoLiquidity => println!("no route"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod dex;
pub mod error;
pub mod models;
pub mod router;
pub mod store;
pub mod utils;

#[cfg(test)]
mod testing;

pub use cache::{load_from_file, save_to_file, TtlCache};
pub use config::{QuoterConfig, RetryConfig};
pub use dex::{AmmQueryProvider, SimulationRequest};
pub use error::{EncodeError, ProviderError, QuoteError, StoreError};
pub use models::{
    ExecutionRoute, PoolFormat, PoolKey, PoolMetadata, QuoteCandidate, QuoteRequest, RouteParams,
    RoutingHints, SwapPath, Token,
};
pub use router::{BestQuote, Discovery, DiscoveryTier, QuoteEngine};
pub use store::{CachedMetadataStore, PoolMetadataStore};
