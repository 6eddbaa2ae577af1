use alloy_primitives::U256;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub fn remove_trailing_slash(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// Floor of the square root (Newton iteration).
pub fn isqrt(value: U256) -> U256 {
    if value < U256::from(2u64) {
        return value;
    }
    let mut x = value;
    // ceil(x / 2) without overflowing at U256::MAX
    let mut y = (x >> 1usize) + (x & U256::from(1u64));
    while y < x {
        x = y;
        y = (x + value / x) >> 1usize;
    }
    x
}

pub fn saturating_u128(value: U256) -> u128 {
    u128::try_from(value).unwrap_or(u128::MAX)
}

/// `a * b / denominator` with overflow reported as `None`.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    a.checked_mul(b).map(|product| product / denominator)
}

/// Exponential backoff delay for `attempt` (0-based), capped at 30s.
pub fn backoff_delay(base_delay_ms: u64, attempt: u32) -> Duration {
    let delay = base_delay_ms.saturating_mul(1u64 << attempt.min(16)).min(30_000);
    Duration::from_millis(delay)
}

/// Retry `f` while `should_retry` accepts the error, up to `retries` extra
/// attempts with exponential backoff.
pub async fn retry_if<T, E, F, Fut, P>(
    retries: u32,
    base_delay_ms: u64,
    should_retry: P,
    f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Debug,
{
    retry_until(retries, base_delay_ms, None, should_retry, f).await
}

/// Like [`retry_if`], but gives up early when the next attempt would start
/// at or after `cutoff`.
pub async fn retry_until<T, E, F, Fut, P>(
    mut retries: u32,
    base_delay_ms: u64,
    cutoff: Option<Instant>,
    should_retry: P,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Debug,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if retries == 0 || !should_retry(&e) => return Err(e),
            Err(e) => {
                let delay = backoff_delay(base_delay_ms, attempt);
                if let Some(cutoff) = cutoff {
                    if Instant::now() + delay >= cutoff {
                        tracing::warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = ?e,
                            "no time left for another attempt"
                        );
                        return Err(e);
                    }
                }
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = ?e,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                retries -= 1;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(U256::ZERO), U256::ZERO);
        assert_eq!(isqrt(U256::from(1u64)), U256::from(1u64));
        assert_eq!(isqrt(U256::from(15u64)), U256::from(3u64));
        assert_eq!(isqrt(U256::from(16u64)), U256::from(4u64));
        assert_eq!(
            isqrt(U256::from(1_000_000u64) * U256::from(3_000_000_000u64)),
            U256::from(54_772_255u64)
        );
        let big = isqrt(U256::MAX);
        assert_eq!(big, U256::from(u128::MAX));
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(500, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(500, 1), Duration::from_millis(1_000));
        assert_eq!(backoff_delay(500, 2), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(500, 10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(remove_trailing_slash("http://store/"), "http://store");
        assert_eq!(remove_trailing_slash("http://store"), "http://store");
    }

    #[tokio::test]
    async fn test_retry_if_stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_if(3, 1, |e: &&str| *e == "transient", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("permanent")
        })
        .await;
        assert_eq!(result, Err("permanent"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_if_exhausts_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_if(3, 1, |_| true, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("transient")
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_until_stops_before_cutoff() {
        let calls = AtomicU32::new(0);
        let cutoff = Instant::now() + Duration::from_millis(150);
        let result: Result<(), &str> = retry_until(3, 100, Some(cutoff), |_| true, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("transient")
        })
        .await;
        assert!(result.is_err());
        // 100ms fits before the cutoff, the following 200ms does not
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
