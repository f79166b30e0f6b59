//! Numeric region codes accepted by the block storage API.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Data centre identifier the backend expects when creating volumes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RegionCode(u32);

impl RegionCode {
    /// Wraps a raw region code.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Raised when the configured region is not a numeric code.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("region code must be an int, got {value:?}")]
pub struct RegionError {
    /// The configured value.
    pub value: String,
}

impl FromStr for RegionCode {
    type Err = RegionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| RegionError {
                value: value.to_owned(),
            })
    }
}
