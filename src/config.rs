//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::provision::PollPolicy;

/// Default endpoint of the Vultr API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.vultr.com";

/// Driver configuration derived from configuration files, environment
/// variables, and defaults.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "VULTR",
    discovery(
        app_name = "vultr-csi",
        env_var = "VULTR_CSI_CONFIG_PATH",
        config_file_name = "vultr-csi.toml",
        dotfile_name = ".vultr-csi.toml",
        project_file_name = "vultr-csi.toml"
    )
)]
pub struct DriverConfig {
    /// API key used to authenticate against the block storage API.
    pub api_key: String,
    /// Numeric data centre code new volumes are placed in. Kept as text so a
    /// malformed value surfaces per request rather than at startup.
    pub region: String,
    /// Base URL of the API, overridable for staging environments.
    #[ortho_config(default = DEFAULT_API_BASE_URL.to_owned())]
    pub api_base_url: String,
    /// Delay before each readiness poll, in milliseconds.
    #[ortho_config(default = 1000)]
    pub poll_interval_ms: u64,
    /// Number of readiness polls before provisioning is abandoned.
    #[ortho_config(default = 10)]
    pub poll_attempts: u32,
    /// Per-request HTTP timeout, in seconds.
    #[ortho_config(default = 30)]
    pub http_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to vultr-csi.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

impl DriverConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(metadata.missing());
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("vultr-csi")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages include guidance on how
    /// to provide missing values.
    ///
    /// The region is only checked for presence; whether it is numeric is
    /// decided when a volume is created.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when the polling budget is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.api_key,
            &FieldMetadata::new("Vultr API key", "VULTR_API_KEY", "api_key"),
        )?;
        Self::require_field(
            &self.region,
            &FieldMetadata::new("region code", "VULTR_REGION", "region"),
        )?;
        Self::require_field(
            &self.api_base_url,
            &FieldMetadata::new("API base URL", "VULTR_API_BASE_URL", "api_base_url"),
        )?;
        if self.poll_attempts == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll_attempts must be at least 1",
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "http_timeout_secs must be at least 1",
            )));
        }
        Ok(())
    }

    /// Readiness polling settings for the provisioning coordinator.
    #[must_use]
    pub const fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.poll_attempts,
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// Timeout applied to each HTTP request.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value the driver cannot use.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}
