//! Configuration error types.

use std::path::Path;

/// Configuration error with source location.
///
/// Raised when a `pictor.toml` source cannot be read or parsed, or when a
/// loaded table is semantically invalid (for example, an empty region
/// candidate list).
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use pictor_error::ConfigError;
    ///
    /// let err = ConfigError::new("region rotation requires at least one candidate region");
    /// assert!(err.message.contains("candidate"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Error for a configuration source that failed to load or parse.
    #[track_caller]
    pub fn source_file(path: impl AsRef<Path>, cause: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "Failed to read configuration from {}: {}",
            path.as_ref().display(),
            cause
        ))
    }
}
