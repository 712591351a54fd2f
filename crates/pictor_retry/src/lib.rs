//! Resilient execution engine for remote image-generation backends.
//!
//! One logical request is retried across transient failures, timeouts, and
//! (optionally) geographic endpoint rotation, while two independent retry
//! budgets are tracked and the precise terminal error is surfaced to the
//! caller.
//!
//! # Architecture
//!
//! - [`MessageClassifier`] maps a backend error message to an [`ErrorClass`];
//!   the [`ErrorClassifier`] trait is the seam for structured-error-code
//!   backends.
//! - [`RetrySetting`] is the request surface (`false` / `true` / partial
//!   options table); resolution produces a fully-populated [`RetryPolicy`].
//! - [`compute_delay`] turns a retry count and policy into a backoff delay
//!   with optional jitter; timeout retries use the fixed
//!   [`TIMEOUT_RETRY_DELAY`] instead.
//! - [`with_deadline`] races an operation against its deadline without
//!   cancelling it.
//! - [`RetryExecutor`] orchestrates the attempt loop.
//! - [`RegionRotator`] re-binds the operation to the next candidate region on
//!   quota exhaustion, with a last-resort fallback attempt.
//!
//! # Example
//!
//! ```no_run
//! use pictor_error::ProviderError;
//! use pictor_retry::RetryExecutor;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), ProviderError> {
//! let executor = RetryExecutor::new();
//! let image = executor
//!     .run("generate_image", None, || async {
//!         // call the backend SDK here
//!         Ok::<_, ProviderError>(vec![0u8; 4])
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backoff;
mod classify;
mod config;
mod executor;
mod policy;
mod pool;
mod region;
mod timeout;

pub use backoff::{TIMEOUT_RETRY_DELAY, compute_delay};
pub use classify::{ErrorClass, ErrorClassifier, MessageClassifier};
pub use config::{PictorConfig, ProviderConfig};
pub use executor::RetryExecutor;
pub use policy::{RetryOptions, RetryPolicy, RetrySetting, resolve};
pub use pool::RegionClientPool;
pub use region::{RegionRotationConfig, RegionRotator};
pub use timeout::with_deadline;
