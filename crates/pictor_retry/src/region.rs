//! Region rotation over the retry loop.
//!
//! Quota exhaustion in one geographic endpoint is often invisible to the
//! next, so on every quota-classified failure the rotator advances a cursor
//! through an ordered candidate list, re-binding the operation to the newly
//! selected region before the next attempt. Once the list is exhausted the
//! cursor clamps to a broad fallback region for the rest of the invocation.

use crate::classify::ErrorClass;
use crate::executor::RetryExecutor;
use crate::policy::RetrySetting;
use crate::timeout::with_deadline;
use pictor_error::{ConfigError, ProviderError, ProviderResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, instrument, warn};

fn default_always_try_fallback() -> bool {
    true
}

/// Ordered candidate regions with a designated fallback.
///
/// Appears in `pictor.toml` keyed by provider:
///
/// ```toml
/// [providers.vertex.regions]
/// candidates = ["us-central1", "us-east4"]
/// fallback = "global"
/// always_try_fallback = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegionRotationConfig {
    /// Candidate regions tried in order; must be non-empty
    pub candidates: Vec<String>,
    /// Broad last-resort region once the candidates are exhausted
    pub fallback: String,
    /// Grant one bonus attempt on the fallback after budget exhaustion
    #[serde(default = "default_always_try_fallback")]
    pub always_try_fallback: bool,
}

impl RegionRotationConfig {
    /// Validate the candidate list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidates.is_empty() {
            return Err(ConfigError::new(
                "region rotation requires at least one candidate region",
            ));
        }
        Ok(())
    }

    /// Region selected for the given cursor position.
    ///
    /// Positions past the end of the candidate list clamp to the fallback.
    fn select(&self, position: usize) -> &str {
        self.candidates
            .get(position)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

/// Wraps the retry loop with quota-driven region rotation.
///
/// Selection is a pure function of classification history: the cursor starts
/// at the first candidate and advances exactly once per quota-classified
/// failure, never on other failures. Quota errors still consume the general
/// retry budget; rotation adds no extra attempts by itself. Cursor state is
/// local to one invocation, so concurrent calls rotate independently.
///
/// # Example
///
/// ```no_run
/// use pictor_error::ProviderError;
/// use pictor_retry::{RegionRotationConfig, RegionRotator, RetryExecutor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let rotation = RegionRotationConfig {
///     candidates: vec!["us-central1".into(), "us-east4".into()],
///     fallback: "global".into(),
///     always_try_fallback: true,
/// };
/// let rotator = RegionRotator::new(RetryExecutor::new(), rotation)?;
/// let image = rotator
///     .run("generate_image", None, |region: String| async move {
///         // call the backend endpoint for `region` here
///         Ok::<_, ProviderError>(vec![0u8; 4])
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RegionRotator {
    executor: RetryExecutor,
    rotation: RegionRotationConfig,
}

impl RegionRotator {
    /// Create a rotator over an executor.
    ///
    /// Fails when the rotation config has no candidate regions.
    pub fn new(
        executor: RetryExecutor,
        rotation: RegionRotationConfig,
    ) -> Result<Self, ConfigError> {
        rotation.validate()?;
        Ok(Self { executor, rotation })
    }

    /// The rotation configuration in effect.
    pub fn rotation(&self) -> &RegionRotationConfig {
        &self.rotation
    }

    /// Run `operation` under retry, re-binding it to the currently selected
    /// region before each attempt.
    ///
    /// After the general budget is exhausted, one bonus attempt is made on
    /// the fallback region — outside the budgets but still under the
    /// deadline guard — provided `always_try_fallback` is set and the last
    /// tried region was not already the fallback. If the bonus attempt also
    /// fails, its error surfaces as the freshest signal.
    #[instrument(skip_all, fields(operation = operation_name))]
    pub async fn run<T, F, Fut>(
        &self,
        operation_name: &str,
        setting: Option<&RetrySetting>,
        operation: F,
    ) -> ProviderResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = ProviderResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let cursor = AtomicUsize::new(0);
        let classifier = self.executor.classifier().clone();
        let rotation = &self.rotation;

        let attempt_operation = || {
            let region = rotation.select(cursor.load(Ordering::SeqCst)).to_string();
            debug!(region = %region, "binding attempt to region");
            operation(region)
        };

        let advance_on_quota = |error: &ProviderError, _attempt: u32| {
            if classifier.classify(error) == ErrorClass::Quota {
                let passed = cursor.fetch_add(1, Ordering::SeqCst);
                info!(
                    from = rotation.select(passed),
                    to = rotation.select(passed + 1),
                    "quota exhausted, rotating region"
                );
            }
        };

        let terminal = match self
            .executor
            .run_observed(operation_name, setting, attempt_operation, advance_on_quota)
            .await
        {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        // The bonus attempt only follows general-budget exhaustion, which is
        // the sole way a retryable-classified error escapes the executor.
        // With retries disabled there is no budget to exhaust.
        let Some(policy) = self.executor.resolve(setting) else {
            return Err(terminal);
        };
        let budget_exhausted = matches!(
            self.executor.classifier().classify(&terminal),
            ErrorClass::Retryable | ErrorClass::Quota
        );
        let last_region = rotation.select(cursor.load(Ordering::SeqCst));

        if !budget_exhausted || !rotation.always_try_fallback || last_region == rotation.fallback {
            return Err(terminal);
        }

        info!(
            fallback = %rotation.fallback,
            last_region,
            "budget exhausted away from fallback, granting one fallback attempt"
        );
        match with_deadline(
            operation_name,
            policy.timeout_ms,
            operation(rotation.fallback.clone()),
        )
        .await
        {
            Ok(value) => Ok(value),
            Err(bonus_error) => {
                warn!(error = %bonus_error, "fallback attempt failed");
                Err(bonus_error)
            }
        }
    }
}
