//! Provider error types for backend calls and deadline guards.

/// Provider-specific error conditions.
///
/// The engine classifies failures by substring-matching the backend's
/// message, so the `Api` variant displays the underlying message verbatim
/// with no decoration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Backend call failed; carries the provider's message unchanged.
    #[display("{}", _0)]
    Api(String),
    /// Synthesized by the timeout guard when an operation outlives its
    /// deadline. Never produced by a backend.
    #[display("timeout: operation '{}' exceeded {}ms deadline", operation, timeout_ms)]
    Timeout {
        /// Name of the guarded operation
        operation: String,
        /// Deadline that was exceeded, in milliseconds
        timeout_ms: u64,
    },
    /// Failed to construct a backend client handle
    #[display("Failed to create provider client: {}", _0)]
    ClientCreation(String),
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use pictor_error::ProviderError;
///
/// let err = ProviderError::api("429 Too Many Requests");
/// assert!(format!("{}", err).contains("429"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create an API error carrying the backend's message verbatim.
    #[track_caller]
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Api(message.into()))
    }

    /// Create the tagged deadline error for a guarded operation.
    #[track_caller]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::new(ProviderErrorKind::Timeout {
            operation: operation.into(),
            timeout_ms,
        })
    }

    /// True when this error was synthesized by the timeout guard.
    ///
    /// Guard-synthesized errors bypass message classification entirely;
    /// a backend message that merely mentions "timeout" does not.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::Timeout { .. })
    }

    /// The message used for classification: the kind's display form.
    ///
    /// For `Api` errors this is the backend's message unchanged.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
