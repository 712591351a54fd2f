//! Retry policy resolution.
//!
//! A request carries an optional [`RetrySetting`]: `false` disables retries,
//! `true` (or absence) selects the full baseline, and a partial options table
//! overrides individual fields. Resolution merges the request value with
//! defaults into a fully-populated [`RetryPolicy`]; no optional fields reach
//! the executor.

use serde::{Deserialize, Serialize};

/// Fully-resolved retry policy.
///
/// Every field is concretely populated. Obtain one through [`resolve`] or
/// [`RetryOptions::overlay`] rather than constructing it ad hoc, unless a
/// test needs precise control.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Maximum general (transient/quota) retries after the first attempt
    pub max_retries: u32,
    /// Base backoff delay in milliseconds
    pub delay_ms: u64,
    /// Multiplier applied per successive general retry
    pub backoff_multiplier: f64,
    /// Upper bound on a single backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Randomize each delay uniformly over `[0, computed]`
    pub jitter: bool,
    /// Per-attempt deadline in milliseconds; `0` disables the guard
    pub timeout_ms: u64,
    /// Maximum timeout retries, budgeted independently of `max_retries`
    pub timeout_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            jitter: true,
            timeout_ms: 45_000,
            timeout_retries: 2,
        }
    }
}

impl RetryPolicy {
    /// Hard ceiling on total attempts, guaranteeing loop termination.
    ///
    /// One initial attempt plus both budgets in full.
    pub fn max_attempts(&self) -> u32 {
        1_u32.saturating_add(self.max_retries)
            .saturating_add(self.timeout_retries)
    }
}

/// Partial retry options supplied on a request.
///
/// Unset fields default from the effective [`RetryPolicy`] during
/// resolution. The `exponential` field is a legacy flag: requests written
/// against the old static-delay behavior set `exponential = false` and get
/// `backoff_multiplier = 1.0` unless they supplied a multiplier explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Overrides [`RetryPolicy::max_retries`]
    pub max_retries: Option<u32>,
    /// Overrides [`RetryPolicy::delay_ms`]
    pub delay_ms: Option<u64>,
    /// Overrides [`RetryPolicy::backoff_multiplier`]
    pub backoff_multiplier: Option<f64>,
    /// Overrides [`RetryPolicy::max_delay_ms`]
    pub max_delay_ms: Option<u64>,
    /// Overrides [`RetryPolicy::jitter`]
    pub jitter: Option<bool>,
    /// Overrides [`RetryPolicy::timeout_ms`]
    pub timeout_ms: Option<u64>,
    /// Overrides [`RetryPolicy::timeout_retries`]
    pub timeout_retries: Option<u32>,
    /// Legacy flag; `false` selects a constant delay (multiplier 1.0)
    pub exponential: Option<bool>,
}

impl RetryOptions {
    /// Merge these options onto `defaults`, producing a concrete policy.
    ///
    /// Each field defaults independently. The legacy `exponential = false`
    /// flag folds into `backoff_multiplier = 1.0` here and nowhere else,
    /// and only when no explicit multiplier was supplied.
    pub fn overlay(&self, defaults: &RetryPolicy) -> RetryPolicy {
        let backoff_multiplier = match (self.backoff_multiplier, self.exponential) {
            (Some(multiplier), _) => multiplier,
            (None, Some(false)) => 1.0,
            (None, _) => defaults.backoff_multiplier,
        };

        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            delay_ms: self.delay_ms.unwrap_or(defaults.delay_ms),
            backoff_multiplier,
            max_delay_ms: self.max_delay_ms.unwrap_or(defaults.max_delay_ms),
            jitter: self.jitter.unwrap_or(defaults.jitter),
            timeout_ms: self.timeout_ms.unwrap_or(defaults.timeout_ms),
            timeout_retries: self.timeout_retries.unwrap_or(defaults.timeout_retries),
        }
    }
}

/// Request-level retry surface: `false`, `true`, or a partial options table.
///
/// # Examples
///
/// ```
/// use pictor_retry::RetrySetting;
///
/// let disabled: RetrySetting = serde_json::from_str("false").unwrap();
/// assert_eq!(disabled, RetrySetting::Flag(false));
///
/// let custom: RetrySetting = serde_json::from_str(r#"{"max_retries": 2}"#).unwrap();
/// assert!(matches!(custom, RetrySetting::Options(_)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RetrySetting {
    /// `true` selects the full defaults; `false` disables retries entirely
    Flag(bool),
    /// Partial overrides merged field-wise onto the defaults
    Options(RetryOptions),
}

/// Resolve a request's retry setting against the effective defaults.
///
/// Returns `None` when retries are disabled: the operation runs exactly once
/// and any error propagates untouched.
pub fn resolve(setting: Option<&RetrySetting>, defaults: &RetryPolicy) -> Option<RetryPolicy> {
    match setting {
        Some(RetrySetting::Flag(false)) => None,
        Some(RetrySetting::Flag(true)) | None => Some(*defaults),
        Some(RetrySetting::Options(options)) => Some(options.overlay(defaults)),
    }
}
