//! Request validation for volume creation.

use thiserror::Error;

use crate::types::{AccessMode, AccessType, CreateVolumeRequest, VolumeCapability};

/// The only access mode a remote block volume can honour.
pub const SUPPORTED_ACCESS_MODE: AccessMode = AccessMode::SingleNodeWriter;

/// Reasons a create request is rejected before touching the backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    /// The request carried an empty name.
    #[error("CreateVolume Name is missing")]
    MissingName,
    /// The request carried no capability descriptors.
    #[error("CreateVolume Volume Capabilities is missing")]
    MissingCapabilities,
    /// At least one descriptor is not supported.
    #[error("CreateVolume Volume capability is not compatible: {reason}")]
    IncompatibleCapability {
        /// Which part of which descriptor failed.
        reason: String,
    },
}

/// Checks name and capabilities of a create request.
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first problem found.
pub fn validate_create_request(request: &CreateVolumeRequest) -> Result<(), ValidationError> {
    if request.name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if request.volume_capabilities.is_empty() {
        return Err(ValidationError::MissingCapabilities);
    }
    check_capabilities(&request.volume_capabilities)
}

/// Returns `true` when every descriptor in `capabilities` is supported.
#[must_use]
pub fn is_valid_capability(capabilities: &[VolumeCapability]) -> bool {
    check_capabilities(capabilities).is_ok()
}

fn check_capabilities(capabilities: &[VolumeCapability]) -> Result<(), ValidationError> {
    for (index, capability) in capabilities.iter().enumerate() {
        check_capability(capability).map_err(|reason| ValidationError::IncompatibleCapability {
            reason: format!("capability {index}: {reason}"),
        })?;
    }
    Ok(())
}

fn check_capability(capability: &VolumeCapability) -> Result<(), String> {
    let Some(mode) = capability.access_mode else {
        return Err(String::from("access mode is missing"));
    };
    if mode != SUPPORTED_ACCESS_MODE {
        return Err(format!(
            "access mode {mode:?} is unsupported, only {SUPPORTED_ACCESS_MODE:?} is allowed"
        ));
    }
    match capability.access_type {
        Some(AccessType::Block | AccessType::Mount { .. }) => Ok(()),
        None => Err(String::from("access type must be block or mount")),
    }
}
