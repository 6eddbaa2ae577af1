use thiserror::Error;

use crate::models::PoolFormat;

/// Revert codes a hook raises when it refuses to price a swap.
pub const HOOK_DECLINED_CODES: &[&str] = &[
    "HookNotImplemented",
    "InvalidHookResponse",
    "HookCallFailed",
    "WrappedError",
];

/// Failures surfaced by an AMM query provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider timed out")]
    Timeout,
    #[error("provider rate limited")]
    RateLimited,
    #[error("provider connection failed: {0}")]
    Connection(String),
    #[error("simulation reverted: {code}")]
    Reverted { code: String },
    #[error("malformed provider input or response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Timeouts, rate limits and connectivity faults are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout | ProviderError::RateLimited | ProviderError::Connection(_)
        )
    }

    pub fn is_hook_declined(&self) -> bool {
        match self {
            ProviderError::Reverted { code } => HOOK_DECLINED_CODES.contains(&code.as_str()),
            _ => false,
        }
    }
}

/// Failures of the persistent pool metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
    #[error("metadata store rate limited")]
    RateLimited,
    #[error("metadata store returned undecodable payload: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::RateLimited)
    }
}

/// A candidate that cannot be represented in the execution layout. Always
/// an upstream construction bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{format} route violates `{field}` invariant: {detail}")]
    InvariantViolation {
        format: PoolFormat,
        field: &'static str,
        detail: String,
    },
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid quote request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// Every tier exhausted while providers were failing transiently and the
    /// metadata store was unreachable.
    #[error("quote sources unavailable: {provider_failures} provider failures, store: {store}")]
    Unavailable {
        provider_failures: usize,
        store: StoreError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Timeout.is_transient());
        assert!(ProviderError::RateLimited.is_transient());
        assert!(ProviderError::Connection("reset".into()).is_transient());
        assert!(!ProviderError::Malformed("bad path".into()).is_transient());
        assert!(!ProviderError::Reverted { code: "HookCallFailed".into() }.is_transient());
    }

    #[test]
    fn test_hook_declined_codes() {
        assert!(ProviderError::Reverted { code: "HookNotImplemented".into() }.is_hook_declined());
        let liquidity = ProviderError::Reverted { code: "InsufficientLiquidity".into() };
        assert!(!liquidity.is_hook_declined());
        assert!(!ProviderError::Timeout.is_hook_declined());
    }
}
