//! Controller service: volume creation, deletion, and the protocol methods
//! this driver does not support.

use std::fmt;

use tracing::{debug, info, instrument};

use crate::backend::{BlockStorage, CreateVolumeParams, RemoteVolume};
use crate::capacity::{gib_to_bytes, resolve_capacity};
use crate::config::DriverConfig;
use crate::error::ControllerError;
use crate::idempotency::{GateOutcome, IdempotencyGate, NameLocks};
use crate::provision::{PollPolicy, ProvisioningCoordinator, RequestContext};
use crate::region::RegionCode;
use crate::types::{
    CreateVolumeRequest, CreateVolumeResponse, DeleteVolumeRequest, DeleteVolumeResponse,
    Topology, Volume,
};
use crate::validate::validate_create_request;

/// Methods of the controller protocol surface.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ControllerOperation {
    /// Provision a volume.
    CreateVolume,
    /// Remove a volume.
    DeleteVolume,
    /// Attach a volume to a node.
    ControllerPublishVolume,
    /// Detach a volume from a node.
    ControllerUnpublishVolume,
    /// Check capabilities of an existing volume.
    ValidateVolumeCapabilities,
    /// Enumerate volumes.
    ListVolumes,
    /// Report available capacity.
    GetCapacity,
    /// Report controller capabilities.
    ControllerGetCapabilities,
    /// Snapshot a volume.
    CreateSnapshot,
    /// Remove a snapshot.
    DeleteSnapshot,
    /// Enumerate snapshots.
    ListSnapshots,
    /// Grow a volume.
    ControllerExpandVolume,
}

impl ControllerOperation {
    /// Every method in protocol order.
    pub const ALL: [Self; 12] = [
        Self::CreateVolume,
        Self::DeleteVolume,
        Self::ControllerPublishVolume,
        Self::ControllerUnpublishVolume,
        Self::ValidateVolumeCapabilities,
        Self::ListVolumes,
        Self::GetCapacity,
        Self::ControllerGetCapabilities,
        Self::CreateSnapshot,
        Self::DeleteSnapshot,
        Self::ListSnapshots,
        Self::ControllerExpandVolume,
    ];

    /// The method name as it appears on the wire.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::CreateVolume => "CreateVolume",
            Self::DeleteVolume => "DeleteVolume",
            Self::ControllerPublishVolume => "ControllerPublishVolume",
            Self::ControllerUnpublishVolume => "ControllerUnpublishVolume",
            Self::ValidateVolumeCapabilities => "ValidateVolumeCapabilities",
            Self::ListVolumes => "ListVolumes",
            Self::GetCapacity => "GetCapacity",
            Self::ControllerGetCapabilities => "ControllerGetCapabilities",
            Self::CreateSnapshot => "CreateSnapshot",
            Self::DeleteSnapshot => "DeleteSnapshot",
            Self::ListSnapshots => "ListSnapshots",
            Self::ControllerExpandVolume => "ControllerExpandVolume",
        }
    }

    /// Resolves a method name, accepting fully qualified gRPC paths such as
    /// `/csi.v1.Controller/ListVolumes`.
    #[must_use]
    pub fn from_method_name(name: &str) -> Option<Self> {
        let method = name.rsplit('/').next().unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|operation| operation.method_name() == method)
    }

    /// Whether the controller implements this method.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::CreateVolume | Self::DeleteVolume)
    }
}

impl fmt::Display for ControllerOperation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.method_name())
    }
}

/// Controller for remote block volumes.
///
/// The service is immutable apart from its per-name lock table and is meant
/// to be shared (for example behind an `Arc`) by concurrent request tasks.
#[derive(Debug)]
pub struct ControllerService<B> {
    storage: B,
    region: String,
    policy: PollPolicy,
    locks: NameLocks,
}

impl<B: BlockStorage> ControllerService<B> {
    /// Creates a controller placing volumes in `region` with the default
    /// polling policy.
    #[must_use]
    pub fn new(storage: B, region: impl Into<String>) -> Self {
        Self {
            storage,
            region: region.into(),
            policy: PollPolicy::default(),
            locks: NameLocks::new(),
        }
    }

    /// Creates a controller using the region and polling settings in `config`.
    #[must_use]
    pub fn from_config(storage: B, config: &DriverConfig) -> Self {
        Self::new(storage, config.region.clone()).with_poll_policy(config.poll_policy())
    }

    /// Overrides the readiness polling policy.
    #[must_use]
    pub const fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &B {
        &self.storage
    }

    /// Provisions a volume, or returns the existing one with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`]; see [`ControllerError::code`] for the
    /// status each failure maps to.
    #[instrument(skip_all, fields(name = %request.name))]
    pub async fn create_volume(
        &self,
        request: &CreateVolumeRequest,
        context: &RequestContext,
    ) -> Result<CreateVolumeResponse, ControllerError> {
        if let Some(interruption) = context.interrupted() {
            return Err(interruption.into_error(None, "starting CreateVolume"));
        }
        validate_create_request(request)?;

        let gate = IdempotencyGate::new(&self.storage, &self.locks);
        let _lease = match gate.enter(&request.name, context).await? {
            GateOutcome::Existing(volume) => {
                let required = request
                    .capacity_range
                    .map_or(0, |range| range.required_bytes);
                if required > gib_to_bytes(volume.size_gb) {
                    debug!(
                        volume_id = %volume.id,
                        existing_gb = volume.size_gb,
                        required_bytes = required,
                        "returning existing volume smaller than the new request"
                    );
                }
                info!(volume_id = %volume.id, "volume already exists");
                return Ok(existing_response(&volume));
            }
            GateOutcome::Vacant(lease) => lease,
        };

        let region: RegionCode = self.region.parse()?;
        let capacity = resolve_capacity(request.capacity_range.as_ref())?;
        let params = CreateVolumeParams {
            region: region.get(),
            size_gb: capacity.size_gb(),
            label: request.name.clone(),
        };

        let provisioned = ProvisioningCoordinator::new(&self.storage, self.policy)
            .provision(&params, context)
            .await?;
        info!(
            volume_id = %provisioned.volume.id,
            size_gb = capacity.size_gb(),
            polls = provisioned.polls,
            "volume is active"
        );

        Ok(CreateVolumeResponse {
            volume: Volume {
                volume_id: provisioned.volume.id,
                capacity_bytes: capacity.bytes(),
                accessible_topology: vec![Topology::region(&self.region)],
            },
        })
    }

    /// Deletes a volume. Deleting a volume that no longer exists succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidArgument`] for an empty identifier
    /// and [`ControllerError::Backend`] when the backend delete fails.
    #[instrument(skip_all, fields(volume_id = %request.volume_id))]
    pub async fn delete_volume(
        &self,
        request: &DeleteVolumeRequest,
    ) -> Result<DeleteVolumeResponse, ControllerError> {
        if request.volume_id.is_empty() {
            return Err(ControllerError::InvalidArgument(String::from(
                "DeleteVolume Volume ID is missing",
            )));
        }

        match self.storage.delete(&request.volume_id).await {
            Ok(()) => info!("volume deleted"),
            Err(err) if B::is_not_found(&err) => info!("volume already absent"),
            Err(err) => return Err(ControllerError::backend("cannot delete volume", &err)),
        }
        Ok(DeleteVolumeResponse {})
    }

    /// Answers a protocol method this controller does not implement.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Unimplemented`] for every unsupported
    /// method and [`ControllerError::InvalidArgument`] when asked about a
    /// supported one, which must go through its dedicated entry point.
    pub fn unsupported(&self, operation: ControllerOperation) -> Result<(), ControllerError> {
        if operation.is_supported() {
            return Err(ControllerError::InvalidArgument(format!(
                "{operation} is served by its own handler"
            )));
        }
        debug!(%operation, "rejecting unsupported controller method");
        Err(ControllerError::Unimplemented { operation })
    }
}

fn existing_response(volume: &RemoteVolume) -> CreateVolumeResponse {
    CreateVolumeResponse {
        volume: Volume {
            volume_id: volume.id.clone(),
            capacity_bytes: gib_to_bytes(volume.size_gb),
            accessible_topology: Vec::new(),
        },
    }
}
