//! Error types for the Vultr backend.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the Vultr backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum VultrBackendError {
    /// Raised when the driver configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the request could not be sent or the response not read.
    #[error("request to {endpoint} failed: {message}")]
    Transport {
        /// API path that was called.
        endpoint: &'static str,
        /// Message reported by the HTTP client.
        message: String,
    },
    /// Raised when the API answers with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Api {
        /// API path that was called.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, usually a plain-text reason.
        body: String,
    },
    /// Raised when a success response cannot be decoded.
    #[error("could not decode {endpoint} response: {message}")]
    Decode {
        /// API path that was called.
        endpoint: &'static str,
        /// Decoder message.
        message: String,
    },
    /// Raised when the addressed volume does not exist.
    #[error("block storage volume {id} not found")]
    NotFound {
        /// Volume identifier that was addressed.
        id: String,
    },
}

impl From<ConfigError> for VultrBackendError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
