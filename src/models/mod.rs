pub mod pool;
pub mod pool_format;
pub mod quote;
pub mod route;
pub mod token;

pub use pool::{
    encode_pool_keys, tick_spacing_for_fee, PoolKey, PoolLiquidity, PoolMetadata, PoolStatus,
    Provenance, Reserves,
};
pub use pool_format::PoolFormat;
pub use quote::QuoteCandidate;
pub use route::{
    apply_slippage, ExecutionRoute, QuoteRequest, RouteParams, RoutingHints, MAX_SLIPPAGE_BPS,
};
pub use token::{PathError, SwapPath, Token};
