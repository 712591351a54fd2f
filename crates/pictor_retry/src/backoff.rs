//! Backoff delay computation.

use crate::RetryPolicy;
use rand::Rng;
use std::time::Duration;

/// Fixed delay before every timeout retry.
///
/// Timeouts never back off exponentially; a hung call says nothing about
/// server load, so each timeout retry waits the same flat interval.
pub const TIMEOUT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Compute the backoff delay for a general retry.
///
/// `general_retry_count` is the 1-based count of general retries so far, not
/// the overall attempt index. The uncapped delay is
/// `delay_ms * backoff_multiplier^(count - 1)`, clamped to `max_delay_ms`.
/// With `jitter` enabled the result is a uniformly random integer number of
/// milliseconds in `[0, computed]`; otherwise the rounded computed value.
///
/// # Examples
///
/// ```
/// use pictor_retry::{RetryPolicy, compute_delay};
/// use std::time::Duration;
///
/// let policy = RetryPolicy {
///     jitter: false,
///     ..Default::default()
/// };
/// assert_eq!(compute_delay(1, &policy), Duration::from_millis(1000));
/// assert_eq!(compute_delay(2, &policy), Duration::from_millis(2000));
/// ```
pub fn compute_delay(general_retry_count: u32, policy: &RetryPolicy) -> Duration {
    let exponent = general_retry_count.saturating_sub(1);
    let uncapped = policy.delay_ms as f64 * policy.backoff_multiplier.powi(exponent as i32);
    let capped = uncapped.min(policy.max_delay_ms as f64);
    // Saturating float-to-int cast; infinities from huge multipliers clamp.
    let computed = capped.round() as u64;

    let millis = if policy.jitter {
        rand::rng().random_range(0..=computed)
    } else {
        computed
    };

    Duration::from_millis(millis)
}
