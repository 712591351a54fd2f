//! The retry attempt loop.

use crate::backoff::{TIMEOUT_RETRY_DELAY, compute_delay};
use crate::classify::{ErrorClass, ErrorClassifier, MessageClassifier};
use crate::policy::{RetryPolicy, RetrySetting, resolve};
use crate::timeout::with_deadline;
use pictor_error::{ProviderError, ProviderResult};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Attempt counters for one invocation.
///
/// The two retry budgets never interact: a string of hangs cannot consume
/// the budget reserved for quota/server errors, and vice versa. Created
/// fresh per invocation, discarded at return.
#[derive(Debug, Default)]
struct RetryState {
    general_retry_count: u32,
    timeout_retry_count: u32,
}

/// Orchestrates the attempt loop for one logical request.
///
/// Each invocation runs a strictly sequential attempt stream: run the
/// operation under the deadline guard, classify any failure, and either
/// rethrow it, or sleep and loop. Concurrent requests use independent
/// invocations with no shared mutable state beyond the read-only defaults.
///
/// The terminal error delivered to the caller is always the real classified
/// error, never a synthetic "retries exhausted" summary; only deadline
/// expiry synthesizes its own distinguishable error.
///
/// # Example
///
/// ```no_run
/// use pictor_error::ProviderError;
/// use pictor_retry::{RetryExecutor, RetryOptions, RetrySetting};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), ProviderError> {
/// let executor = RetryExecutor::new();
/// let setting = RetrySetting::Options(RetryOptions {
///     max_retries: Some(2),
///     ..Default::default()
/// });
/// let bytes = executor
///     .run("generate_image", Some(&setting), || async {
///         Ok::<_, ProviderError>(vec![0u8; 4])
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RetryExecutor {
    defaults: RetryPolicy,
    classifier: Arc<dyn ErrorClassifier>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutor {
    /// Create an executor with the baseline policy and message classifier.
    pub fn new() -> Self {
        Self::with_defaults(RetryPolicy::default())
    }

    /// Create an executor with explicit policy defaults.
    ///
    /// Request-level settings still override these field-wise.
    pub fn with_defaults(defaults: RetryPolicy) -> Self {
        Self {
            defaults,
            classifier: Arc::new(MessageClassifier),
        }
    }

    /// Replace the error classifier.
    ///
    /// Lets a backend with structured error codes supply its own
    /// classification without touching the attempt loop.
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// The classifier this executor dispatches on.
    pub fn classifier(&self) -> &Arc<dyn ErrorClassifier> {
        &self.classifier
    }

    /// The policy defaults this executor resolves against.
    pub fn defaults(&self) -> &RetryPolicy {
        &self.defaults
    }

    /// Resolve a request setting against this executor's defaults.
    ///
    /// `None` means retries are disabled for the request.
    pub fn resolve(&self, setting: Option<&RetrySetting>) -> Option<RetryPolicy> {
        resolve(setting, &self.defaults)
    }

    /// Run `operation` to completion under the resolved retry policy.
    pub async fn run<T, F, Fut>(
        &self,
        operation_name: &str,
        setting: Option<&RetrySetting>,
        operation: F,
    ) -> ProviderResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ProviderResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.run_observed(operation_name, setting, operation, |_, _| {})
            .await
    }

    /// Run `operation` with an observer invoked before each retry sleep.
    ///
    /// `on_retry(&error, attempt)` fires once per retried failure with the
    /// 1-based overall attempt index; its return value is ignored. It never
    /// fires for the terminal error.
    #[instrument(skip_all, fields(operation = operation_name))]
    pub async fn run_observed<T, F, Fut, O>(
        &self,
        operation_name: &str,
        setting: Option<&RetrySetting>,
        operation: F,
        mut on_retry: O,
    ) -> ProviderResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ProviderResult<T>> + Send + 'static,
        T: Send + 'static,
        O: FnMut(&ProviderError, u32),
    {
        let Some(policy) = self.resolve(setting) else {
            // Retries disabled: exactly one unguarded run, errors untouched.
            debug!("retries disabled, running operation once");
            return operation().await;
        };

        let mut state = RetryState::default();
        let max_attempts = policy.max_attempts();
        let mut last_error: Option<ProviderError> = None;

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, "starting attempt");

            let outcome = with_deadline(operation_name, policy.timeout_ms, operation()).await;

            let error = match outcome {
                Ok(value) => {
                    debug!(attempt, "operation succeeded");
                    return Ok(value);
                }
                Err(error) => error,
            };

            match self.classifier.classify(&error) {
                ErrorClass::NonRetryable => {
                    warn!(attempt, error = %error, "permanent error, failing immediately");
                    return Err(error);
                }
                ErrorClass::Timeout => {
                    state.timeout_retry_count += 1;
                    if state.timeout_retry_count > policy.timeout_retries {
                        warn!(
                            attempt,
                            timeout_retries = policy.timeout_retries,
                            "timeout budget exhausted"
                        );
                        return Err(error);
                    }
                    warn!(
                        attempt,
                        timeout_retry = state.timeout_retry_count,
                        "attempt timed out, will retry after fixed delay"
                    );
                    on_retry(&error, attempt);
                    tokio::time::sleep(TIMEOUT_RETRY_DELAY).await;
                }
                ErrorClass::Retryable | ErrorClass::Quota => {
                    state.general_retry_count += 1;
                    if state.general_retry_count > policy.max_retries {
                        warn!(
                            attempt,
                            max_retries = policy.max_retries,
                            error = %error,
                            "general retry budget exhausted"
                        );
                        return Err(error);
                    }
                    let delay = compute_delay(state.general_retry_count, &policy);
                    warn!(
                        attempt,
                        general_retry = state.general_retry_count,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient error, will retry"
                    );
                    on_retry(&error, attempt);
                    tokio::time::sleep(delay).await;
                }
            }

            last_error = Some(error);
        }

        // Unreachable given the budget accounting above; rethrow the last
        // observed error rather than hang.
        Err(last_error
            .unwrap_or_else(|| ProviderError::api("retry loop exited without an outcome")))
    }
}
