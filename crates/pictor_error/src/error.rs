//! Top-level error wrapper types.

use crate::{ConfigError, ProviderError};

/// This is the foundation error enum for the pictor workspace.
///
/// # Examples
///
/// ```
/// use pictor_error::{PictorError, ProviderError};
///
/// let provider_err = ProviderError::api("500 Internal Server Error");
/// let err: PictorError = provider_err.into();
/// assert!(format!("{}", err).contains("500"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PictorErrorKind {
    /// Backend provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Pictor error with kind discrimination.
///
/// # Examples
///
/// ```
/// use pictor_error::{ConfigError, PictorResult};
///
/// fn might_fail() -> PictorResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Pictor Error: {}", _0)]
pub struct PictorError(Box<PictorErrorKind>);

impl PictorError {
    /// Create a new error from a kind.
    pub fn new(kind: PictorErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PictorErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to PictorErrorKind
impl<T> From<T> for PictorError
where
    T: Into<PictorErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for pictor operations.
///
/// # Examples
///
/// ```
/// use pictor_error::{PictorResult, ProviderError};
///
/// fn render() -> PictorResult<String> {
///     Err(ProviderError::api("404 Not Found"))?
/// }
/// ```
pub type PictorResult<T> = std::result::Result<T, PictorError>;
