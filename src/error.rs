//! Controller error taxonomy and its mapping onto gRPC status codes.

use thiserror::Error;
use tonic::{Code, Status};

use crate::capacity::CapacityError;
use crate::controller::ControllerOperation;
use crate::region::RegionError;
use crate::validate::ValidationError;

/// Errors surfaced by the controller service.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ControllerError {
    /// The create request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Any other malformed request field.
    #[error("{0}")]
    InvalidArgument(String),
    /// The configured region is not a numeric code.
    #[error(transparent)]
    Region(#[from] RegionError),
    /// The requested capacity cannot be satisfied.
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    /// A backend call failed; the backend's message is passed through.
    #[error("{context}: {message}")]
    Backend {
        /// What the controller was doing.
        context: &'static str,
        /// Message reported by the backend.
        message: String,
    },
    /// The volume never became active within the polling budget.
    #[error("{message}")]
    ProvisionTimeout {
        /// Volume that was being waited on.
        volume_id: String,
        /// Human-readable description, including any cleanup note.
        message: String,
    },
    /// The caller cancelled the request.
    #[error("{message}")]
    Cancelled {
        /// Volume that was being waited on, if one had been created.
        volume_id: Option<String>,
        /// Human-readable description, including any cleanup note.
        message: String,
    },
    /// The caller's deadline passed.
    #[error("{message}")]
    DeadlineExceeded {
        /// Volume that was being waited on, if one had been created.
        volume_id: Option<String>,
        /// Human-readable description, including any cleanup note.
        message: String,
    },
    /// The protocol method is not supported by this controller.
    #[error("{operation} is not implemented")]
    Unimplemented {
        /// The method that was invoked.
        operation: ControllerOperation,
    },
}

impl ControllerError {
    /// Wraps a backend failure with the step that produced it.
    #[must_use]
    pub fn backend(context: &'static str, error: &impl std::fmt::Display) -> Self {
        Self::Backend {
            context,
            message: error.to_string(),
        }
    }

    /// Status code reported to the orchestrator.
    #[must_use]
    pub const fn code(&self) -> Code {
        match self {
            Self::Validation(_) | Self::InvalidArgument(_) => Code::InvalidArgument,
            Self::Region(_) => Code::Aborted,
            Self::Capacity(_) => Code::OutOfRange,
            Self::Backend { .. } | Self::ProvisionTimeout { .. } => Code::Internal,
            Self::Cancelled { .. } => Code::Cancelled,
            Self::DeadlineExceeded { .. } => Code::DeadlineExceeded,
            Self::Unimplemented { .. } => Code::Unimplemented,
        }
    }

    /// Appends a parenthesised note to errors that describe an abandoned
    /// volume. Other variants are returned unchanged.
    #[must_use]
    pub fn with_note(self, note: &str) -> Self {
        match self {
            Self::ProvisionTimeout { volume_id, message } => Self::ProvisionTimeout {
                volume_id,
                message: append_note(message, note),
            },
            Self::Cancelled { volume_id, message } => Self::Cancelled {
                volume_id,
                message: append_note(message, note),
            },
            Self::DeadlineExceeded { volume_id, message } => Self::DeadlineExceeded {
                volume_id,
                message: append_note(message, note),
            },
            other => other,
        }
    }
}

fn append_note(message: String, note: &str) -> String {
    format!("{message} ({note})")
}

impl From<ControllerError> for Status {
    fn from(error: ControllerError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}
