//! Request and response types for the controller provisioning protocol.
//!
//! The shapes follow the CSI controller messages closely enough that a gRPC
//! harness can convert to and from them field by field. Only the fields the
//! adapter reads or writes are modelled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Topology key carrying the region a volume is reachable from.
pub const TOPOLOGY_REGION_KEY: &str = "region";

/// Access mode requested for a volume.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMode {
    /// Read-write on a single node.
    SingleNodeWriter,
    /// Read-only on a single node.
    SingleNodeReaderOnly,
    /// Read-only on many nodes.
    MultiNodeReaderOnly,
    /// Read-only on many nodes with a single writer.
    MultiNodeSingleWriter,
    /// Read-write on many nodes.
    MultiNodeMultiWriter,
    /// Read-write by a single workload on a single node.
    SingleNodeSingleWriter,
    /// Read-write by many workloads on a single node.
    SingleNodeMultiWriter,
}

/// How the volume is consumed on the node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Exposed as a raw block device.
    Block,
    /// Formatted and mounted as a filesystem.
    Mount {
        /// Filesystem type, empty for the node default.
        #[serde(default)]
        fs_type: String,
        /// Extra mount options.
        #[serde(default)]
        mount_flags: Vec<String>,
    },
}

/// A capability the caller requires of the volume.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct VolumeCapability {
    /// Requested access mode. `None` models a descriptor without the field.
    #[serde(default)]
    pub access_mode: Option<AccessMode>,
    /// Requested access type. `None` models a descriptor without the field.
    #[serde(default)]
    pub access_type: Option<AccessType>,
}

impl VolumeCapability {
    /// Capability for a filesystem mount with the given access mode.
    #[must_use]
    pub fn mount(access_mode: AccessMode) -> Self {
        Self {
            access_mode: Some(access_mode),
            access_type: Some(AccessType::Mount {
                fs_type: String::new(),
                mount_flags: Vec::new(),
            }),
        }
    }

    /// Capability for a raw block device with the given access mode.
    #[must_use]
    pub const fn block(access_mode: AccessMode) -> Self {
        Self {
            access_mode: Some(access_mode),
            access_type: Some(AccessType::Block),
        }
    }
}

/// Requested byte bounds. Zero means the bound is not set.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CapacityRange {
    /// Minimum acceptable size in bytes.
    #[serde(default)]
    pub required_bytes: u64,
    /// Maximum acceptable size in bytes.
    #[serde(default)]
    pub limit_bytes: u64,
}

/// Request to provision a volume.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CreateVolumeRequest {
    /// Caller chosen name; the idempotency key.
    pub name: String,
    /// Required capabilities; must not be empty.
    #[serde(default)]
    pub volume_capabilities: Vec<VolumeCapability>,
    /// Optional size bounds.
    #[serde(default)]
    pub capacity_range: Option<CapacityRange>,
}

/// Key-value placement segments.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Topology {
    /// Segments such as `{"region": "1"}`.
    pub segments: BTreeMap<String, String>,
}

impl Topology {
    /// Topology pinned to a single region.
    #[must_use]
    pub fn region(region: &str) -> Self {
        Self {
            segments: BTreeMap::from([(TOPOLOGY_REGION_KEY.to_owned(), region.to_owned())]),
        }
    }
}

/// Volume description returned to the orchestrator.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Volume {
    /// Backend identifier.
    pub volume_id: String,
    /// Provisioned capacity in bytes.
    pub capacity_bytes: u64,
    /// Where the volume is reachable; empty when unknown.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessible_topology: Vec<Topology>,
}

/// Response to [`CreateVolumeRequest`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CreateVolumeResponse {
    /// The provisioned or pre-existing volume.
    pub volume: Volume,
}

/// Request to delete a volume.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeleteVolumeRequest {
    /// Backend identifier of the volume.
    pub volume_id: String,
}

/// Empty acknowledgement of a delete.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeleteVolumeResponse {}
