//! Error classification for retry decisions.
//!
//! Backends surface failures as free-text messages, so classification is a
//! case-insensitive substring heuristic. The tables live behind the
//! [`ErrorClassifier`] trait so a backend with structured error codes can
//! supply an alternate implementation without touching the executor.

use pictor_error::ProviderError;

/// High-level classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Config/auth/malformed-request failure; fails fast with zero retries.
    NonRetryable,
    /// Transient failure (5xx, network blips); consumes the general budget.
    Retryable,
    /// Deadline exceeded; consumes the independent timeout budget.
    Timeout,
    /// Rate/usage-limit exhaustion; consumes the general budget and, when
    /// region rotation is configured, advances the region cursor.
    Quota,
}

/// Maps a provider failure to an [`ErrorClass`].
pub trait ErrorClassifier: Send + Sync {
    /// Classify a single failure. First match wins; unknown errors must
    /// classify as [`ErrorClass::NonRetryable`] so they fail fast rather
    /// than being silently retried.
    fn classify(&self, error: &ProviderError) -> ErrorClass;
}

/// Markers that identify a permanent config/auth failure.
const NON_RETRYABLE_MARKERS: &[&str] = &[
    "400",
    "401",
    "403",
    "authentication",
    "unauthorized",
    "forbidden",
];

/// Markers that identify rate/quota exhaustion.
const QUOTA_MARKERS: &[&str] = &[
    "429",
    "resource exhausted",
    "quota exceeded",
    "too many requests",
    "rate limit",
];

/// Markers that identify a transient server or network failure.
const RETRYABLE_MARKERS: &[&str] = &[
    "408",
    "500",
    "502",
    "503",
    "504",
    "timeout",
    "etimedout",
    "esockettimedout",
    "econnreset",
    "econnrefused",
    "enotfound",
    "econnaborted",
    "epipe",
    "ehostunreach",
    "enetunreach",
    "socket hang up",
];

/// Default classifier: case-insensitive substring matching over the
/// backend's message.
///
/// Errors synthesized by the timeout guard are tagged out-of-band and always
/// classify as [`ErrorClass::Timeout`], bypassing the message tables; a
/// backend message that merely contains "timeout" classifies as
/// [`ErrorClass::Retryable`] and consumes the general budget.
///
/// # Examples
///
/// ```
/// use pictor_error::ProviderError;
/// use pictor_retry::{ErrorClass, ErrorClassifier, MessageClassifier};
///
/// let classifier = MessageClassifier;
/// let err = ProviderError::api("429 Too Many Requests");
/// assert_eq!(classifier.classify(&err), ErrorClass::Quota);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageClassifier;

impl ErrorClassifier for MessageClassifier {
    fn classify(&self, error: &ProviderError) -> ErrorClass {
        if error.is_timeout() {
            return ErrorClass::Timeout;
        }

        let message = error.message().to_lowercase();

        if contains_any(&message, NON_RETRYABLE_MARKERS) {
            ErrorClass::NonRetryable
        } else if contains_any(&message, QUOTA_MARKERS) {
            ErrorClass::Quota
        } else if contains_any(&message, RETRYABLE_MARKERS) {
            ErrorClass::Retryable
        } else {
            // Unknown errors fail fast, never silently retried.
            ErrorClass::NonRetryable
        }
    }
}

fn contains_any(message: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| message.contains(marker))
}
