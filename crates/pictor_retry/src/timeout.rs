//! Deadline guard for backend operations.
//!
//! The guard races an operation against its deadline without cancelling it:
//! there is no cancellation token threaded into backend SDK calls, so on
//! expiry the guard abandons interest in the result while the call keeps
//! running detached. The abandoned completion is silently discarded; it can
//! neither double-deliver a result nor surface a late failure.

use pictor_error::{ProviderError, ProviderResult};
use std::time::Duration;
use tracing::warn;

/// Race `operation` against a deadline of `timeout_ms` milliseconds.
///
/// If the operation settles in time its outcome passes through unchanged.
/// Once the deadline passes, the guard fails with the tagged timeout error
/// carrying `operation_name` and the bound, and the in-flight work is left
/// running in the background. A `timeout_ms` of zero disables the guard
/// entirely.
///
/// # Examples
///
/// ```
/// use pictor_error::ProviderError;
/// use pictor_retry::with_deadline;
///
/// # #[tokio::main]
/// # async fn main() {
/// let err = with_deadline("generate_image", 10, async {
///     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
///     Ok::<_, ProviderError>(())
/// })
/// .await
/// .unwrap_err();
/// assert!(err.is_timeout());
/// # }
/// ```
pub async fn with_deadline<T, Fut>(
    operation_name: &str,
    timeout_ms: u64,
    operation: Fut,
) -> ProviderResult<T>
where
    Fut: Future<Output = ProviderResult<T>> + Send + 'static,
    T: Send + 'static,
{
    if timeout_ms == 0 {
        return operation.await;
    }

    // Spawning lets the deadline abandon the future without dropping it.
    let handle = tokio::spawn(operation);

    match tokio::time::timeout(Duration::from_millis(timeout_ms), handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => {
            // The operation task panicked. Surface it as a provider failure;
            // unknown messages classify as non-retryable and fail fast.
            warn!(operation = operation_name, error = %join_error, "operation task failed");
            Err(ProviderError::api(format!(
                "operation '{}' aborted: {}",
                operation_name, join_error
            )))
        }
        Err(_elapsed) => {
            // Dropping the join handle detaches the task; its eventual
            // settlement is discarded.
            warn!(
                operation = operation_name,
                timeout_ms, "operation exceeded deadline, abandoning result"
            );
            Err(ProviderError::timeout(operation_name, timeout_ms))
        }
    }
}
