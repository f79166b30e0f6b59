//! Backend abstraction for remote block storage volumes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Status reported by the storage backend for a volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VolumeStatus {
    /// The backend is still allocating the volume.
    Creating,
    /// The volume is ready for use.
    Active,
    /// The backend gave up provisioning the volume.
    Error,
    /// Any status string the adapter does not recognise, kept verbatim.
    Unknown(String),
}

impl VolumeStatus {
    /// Parses a backend status string. Matching is case-insensitive and
    /// `pending` is treated as an alias for `creating`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "creating" | "pending" => Self::Creating,
            "active" => Self::Active,
            "error" => Self::Error,
            _ => Self::Unknown(raw.to_owned()),
        }
    }

    /// Returns `true` once the volume can be handed to the orchestrator.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for VolumeStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => formatter.write_str("creating"),
            Self::Active => formatter.write_str("active"),
            Self::Error => formatter.write_str("error"),
            Self::Unknown(raw) => formatter.write_str(raw),
        }
    }
}

/// Volume as tracked by the storage backend.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteVolume {
    /// Provider specific volume identifier.
    pub id: String,
    /// Provisioned size in whole gibibytes.
    pub size_gb: u64,
    /// Last status observed for the volume.
    pub status: VolumeStatus,
}

/// Parameters for a remote create call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateVolumeParams {
    /// Numeric region (data centre) identifier.
    pub region: u32,
    /// Requested size in whole gibibytes.
    pub size_gb: u64,
    /// Label recorded on the volume; the idempotency key.
    pub label: String,
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by block storage providers.
pub trait BlockStorage: Send + Sync {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Finds a volume whose identifier or label equals `name_or_id`.
    ///
    /// Returns `Ok(None)` when no such volume exists.
    fn lookup<'a>(&'a self, name_or_id: &'a str)
    -> BackendFuture<'a, Option<RemoteVolume>, Self::Error>;

    /// Requests a new volume. The returned volume is usually not yet active.
    fn create<'a>(
        &'a self,
        params: &'a CreateVolumeParams,
    ) -> BackendFuture<'a, RemoteVolume, Self::Error>;

    /// Deletes the volume with the given identifier.
    fn delete<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error>;

    /// Reports whether `error` means the volume does not exist.
    ///
    /// Deletes treat such errors as success. Backends without a distinct
    /// not-found signal keep the default.
    fn is_not_found(_error: &Self::Error) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::VolumeStatus;

    #[rstest]
    #[case("active", VolumeStatus::Active)]
    #[case("Active ", VolumeStatus::Active)]
    #[case("pending", VolumeStatus::Creating)]
    #[case("creating", VolumeStatus::Creating)]
    #[case("error", VolumeStatus::Error)]
    #[case("resizing", VolumeStatus::Unknown(String::from("resizing")))]
    fn parses_backend_statuses(#[case] raw: &str, #[case] expected: VolumeStatus) {
        assert_eq!(VolumeStatus::parse(raw), expected);
    }

    #[rstest]
    fn unknown_status_displays_verbatim() {
        let status = VolumeStatus::parse("migrating");
        assert_eq!(status.to_string(), "migrating");
        assert!(!status.is_active());
    }
}
