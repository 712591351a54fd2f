//! TOML-based configuration for retry defaults and region rotation.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from pictor.toml)
//! - User overrides (./pictor.toml or ~/.config/pictor/pictor.toml)
//! - Automatic merging with user values taking precedence

use crate::policy::{RetryOptions, RetryPolicy};
use crate::region::RegionRotationConfig;
use config::{Config, File, FileFormat};
use pictor_error::{ConfigError, PictorError, PictorResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Configuration for a specific backend provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ProviderConfig {
    /// Retry overrides applied on top of the global `[retry]` table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOptions>,

    /// Region rotation for providers with regional endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<RegionRotationConfig>,
}

/// Top-level pictor configuration.
///
/// Loads retry defaults and region tables from TOML files with a precedence
/// system:
/// 1. Bundled defaults (include_str! from pictor.toml)
/// 2. User override (./pictor.toml or ~/.config/pictor/pictor.toml)
///
/// # Example
///
/// ```no_run
/// use pictor_retry::PictorConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PictorConfig::load()?;
/// let policy = config.retry_policy(Some("vertex"));
/// println!("vertex timeout: {}ms", policy.timeout_ms);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct PictorConfig {
    /// Global retry overrides applied on top of the built-in baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOptions>,

    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl PictorConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> PictorResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| PictorError::from(ConfigError::source_file(path.as_ref(), e)))?
            .try_deserialize()
            .map_err(|e| {
                PictorError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override
    /// earlier):
    /// 1. Bundled defaults (pictor.toml shipped with the library)
    /// 2. User config in home directory (~/.config/pictor/pictor.toml)
    /// 3. User config in current directory (./pictor.toml)
    ///
    /// User config files are optional and will be silently skipped if not
    /// found.
    #[instrument]
    pub fn load() -> PictorResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../../../pictor.toml");

        let mut builder = Config::builder()
            // Start with bundled defaults
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // Add user config from home directory (optional)
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/pictor/pictor.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        // Add user config from current directory (optional, highest precedence)
        builder = builder.add_source(File::with_name("pictor").required(false));

        builder
            .build()
            .map_err(|e| {
                PictorError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                PictorError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Resolve the effective retry defaults for a provider.
    ///
    /// Overlay order: built-in baseline, then the global `[retry]` table,
    /// then the provider's own `retry` table. Request-level settings are
    /// applied later by the executor.
    #[instrument(skip(self))]
    pub fn retry_policy(&self, provider: Option<&str>) -> RetryPolicy {
        let mut policy = RetryPolicy::default();

        if let Some(global) = &self.retry {
            policy = global.overlay(&policy);
        }

        if let Some(overrides) = provider
            .and_then(|name| self.providers.get(name))
            .and_then(|provider_config| provider_config.retry.as_ref())
        {
            policy = overrides.overlay(&policy);
        }

        debug!(?provider, ?policy, "Resolved retry defaults");
        policy
    }

    /// Region rotation for a provider, when configured.
    pub fn regions(&self, provider: &str) -> Option<&RegionRotationConfig> {
        self.providers
            .get(provider)
            .and_then(|provider_config| provider_config.regions.as_ref())
    }
}
