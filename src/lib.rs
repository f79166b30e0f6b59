//! Core library for the Vultr CSI controller adapter.
//!
//! The crate translates container-orchestrator volume requests into calls
//! against a remote block storage backend. It validates the request, derives
//! a bounded capacity, provisions the volume, and waits for it to become
//! usable before answering. Requests are idempotent by volume name, and
//! concurrent requests for the same name are serialised so at most one
//! backend volume is ever created.
//!
//! The [`BlockStorage`] trait is the seam between controller logic and the
//! provider; [`VultrBackend`] implements it against the Vultr HTTP API and
//! [`test_support::ScriptedStorage`] implements it in memory.

pub mod backend;
pub mod capacity;
pub mod config;
pub mod controller;
pub mod error;
pub mod idempotency;
pub mod provision;
pub mod region;
pub mod test_support;
pub mod types;
pub mod validate;
pub mod vultr;

pub use backend::{BlockStorage, CreateVolumeParams, RemoteVolume, VolumeStatus};
pub use capacity::{CapacityError, ResolvedCapacity, resolve_capacity};
pub use config::{ConfigError, DriverConfig};
pub use controller::{ControllerOperation, ControllerService};
pub use error::ControllerError;
pub use provision::{PollPolicy, RequestContext};
pub use region::{RegionCode, RegionError};
pub use types::{
    AccessMode, AccessType, CapacityRange, CreateVolumeRequest, CreateVolumeResponse,
    DeleteVolumeRequest, DeleteVolumeResponse, Topology, Volume, VolumeCapability,
};
pub use validate::ValidationError;
pub use vultr::{VultrBackend, VultrBackendError};
