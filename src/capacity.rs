//! Capacity resolution for new volumes.
//!
//! Requests are expressed in bytes but the backend allocates whole
//! gibibytes, so every resolved size is rounded up to a GiB boundary and
//! checked against the provider's bounds.

use thiserror::Error;

use crate::types::CapacityRange;

/// Bytes in one gibibyte.
pub const GIB: u64 = 1 << 30;
/// Bytes in one tebibyte.
pub const TIB: u64 = 1 << 40;
/// Smallest volume the backend allocates.
pub const MIN_VOLUME_BYTES: u64 = GIB;
/// Largest volume the backend allocates.
pub const MAX_VOLUME_BYTES: u64 = 10 * TIB;
/// Size used when the caller does not ask for one.
pub const DEFAULT_VOLUME_BYTES: u64 = 10 * GIB;

/// Where a resolved size came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CapacitySource {
    /// No range was supplied; the default applies.
    Default,
    /// Derived from the caller's range.
    Requested,
}

/// Concrete size chosen for a new volume.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResolvedCapacity {
    size_gb: u64,
    source: CapacitySource,
}

impl ResolvedCapacity {
    /// Size in whole gibibytes, as sent to the backend.
    #[must_use]
    pub const fn size_gb(&self) -> u64 {
        self.size_gb
    }

    /// Size in bytes, as reported to the orchestrator.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        gib_to_bytes(self.size_gb)
    }

    /// Whether the size was requested or defaulted.
    #[must_use]
    pub const fn source(&self) -> CapacitySource {
        self.source
    }
}

/// Reasons a capacity range cannot be satisfied.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CapacityError {
    /// Neither bound is set.
    #[error("capacity range must set required_bytes or limit_bytes")]
    Unbounded,
    /// The lower bound exceeds the upper bound.
    #[error("required_bytes {required} exceeds limit_bytes {limit}")]
    Inverted {
        /// Requested minimum.
        required: u64,
        /// Requested maximum.
        limit: u64,
    },
    /// The request is larger than the backend allows.
    #[error("requested {requested} bytes exceeds the maximum volume size of {max} bytes")]
    TooLarge {
        /// Requested size in bytes.
        requested: u64,
        /// Maximum supported size in bytes.
        max: u64,
    },
    /// The limit is below the smallest size the backend can allocate.
    #[error("limit_bytes {limit} cannot hold the smallest allocatable size of {needed} bytes")]
    LimitTooSmall {
        /// Requested maximum.
        limit: u64,
        /// Size the resolver had to choose.
        needed: u64,
    },
}

/// Converts whole gibibytes to bytes, saturating on overflow.
#[must_use]
pub const fn gib_to_bytes(size_gb: u64) -> u64 {
    size_gb.saturating_mul(GIB)
}

/// Resolves the size for a new volume.
///
/// An absent range yields [`DEFAULT_VOLUME_BYTES`]. Otherwise the required
/// bytes (or the default capped by the limit when only a limit is set) are
/// raised to [`MIN_VOLUME_BYTES`] and rounded up to a whole GiB.
///
/// # Errors
///
/// Returns [`CapacityError`] when the range is malformed, exceeds
/// [`MAX_VOLUME_BYTES`], or its limit cannot hold the rounded size.
pub fn resolve_capacity(range: Option<&CapacityRange>) -> Result<ResolvedCapacity, CapacityError> {
    let Some(range) = range else {
        return Ok(ResolvedCapacity {
            size_gb: DEFAULT_VOLUME_BYTES.div_ceil(GIB),
            source: CapacitySource::Default,
        });
    };

    let CapacityRange {
        required_bytes: required,
        limit_bytes: limit,
    } = *range;
    let requested = match (required, limit) {
        (0, 0) => return Err(CapacityError::Unbounded),
        (0, _) => DEFAULT_VOLUME_BYTES.min(limit),
        (_, 0) => required,
        _ if required > limit => return Err(CapacityError::Inverted { required, limit }),
        _ => required,
    };

    if requested > MAX_VOLUME_BYTES {
        return Err(CapacityError::TooLarge {
            requested,
            max: MAX_VOLUME_BYTES,
        });
    }

    let size_gb = requested.max(MIN_VOLUME_BYTES).div_ceil(GIB);
    let needed = gib_to_bytes(size_gb);
    if limit != 0 && needed > limit {
        return Err(CapacityError::LimitTooSmall { limit, needed });
    }

    Ok(ResolvedCapacity {
        size_gb,
        source: CapacitySource::Requested,
    })
}
