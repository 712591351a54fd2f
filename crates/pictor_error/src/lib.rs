//! Error types for the pictor image-generation middleware.
//!
//! This crate provides the foundation error types used throughout the pictor
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use pictor_error::{PictorResult, ProviderError};
//!
//! fn render() -> PictorResult<String> {
//!     Err(ProviderError::api("503 Service Unavailable"))?
//! }
//!
//! match render() {
//!     Ok(image) => println!("Got: {}", image),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod provider;

pub use config::ConfigError;
pub use error::{PictorError, PictorErrorKind, PictorResult};
pub use provider::{ProviderError, ProviderErrorKind, ProviderResult};
