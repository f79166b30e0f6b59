//! Command-line interface definitions for the `vultr-csi` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page. It
//! must only depend on `clap` and the standard library.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Top-level CLI for the `vultr-csi` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vultr-csi",
    about = "Provision and delete Vultr block storage volumes the way a CSI controller would",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Log filter used when `RUST_LOG` is unset (for example `debug`).
    #[arg(long, global = true, value_name = "FILTER", default_value = "info")]
    pub(crate) log_level: String,
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub(crate) log_json: bool,
    /// Controller operation to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Controller operations exposed on the command line.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Create a volume, or return the existing volume with the same name.
    #[command(name = "create-volume")]
    CreateVolume(CreateVolumeCommand),
    /// Delete a volume by identifier.
    #[command(name = "delete-volume")]
    DeleteVolume(DeleteVolumeCommand),
    /// List the controller methods and whether each one is supported.
    #[command(name = "capabilities")]
    Capabilities,
}

/// Arguments for `vultr-csi create-volume`.
#[derive(Debug, Args)]
pub(crate) struct CreateVolumeCommand {
    /// Volume name; also the idempotency key.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: String,
    /// Minimum capacity in bytes.
    #[arg(long, value_name = "BYTES")]
    pub(crate) required_bytes: Option<u64>,
    /// Maximum capacity in bytes.
    #[arg(long, value_name = "BYTES")]
    pub(crate) limit_bytes: Option<u64>,
    /// Requested access mode.
    #[arg(long, value_enum, default_value_t = AccessModeArg::SingleNodeWriter)]
    pub(crate) access_mode: AccessModeArg,
    /// Request a raw block device instead of a mounted filesystem.
    #[arg(long, conflicts_with = "fs_type")]
    pub(crate) block: bool,
    /// Filesystem type for a mounted volume.
    #[arg(long, value_name = "FS")]
    pub(crate) fs_type: Option<String>,
    /// Give up after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) timeout_secs: Option<u64>,
}

/// Arguments for `vultr-csi delete-volume`.
#[derive(Debug, Args)]
pub(crate) struct DeleteVolumeCommand {
    /// Identifier of the volume to delete.
    #[arg(long, value_name = "ID")]
    pub(crate) volume_id: String,
}

/// Access modes accepted on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum AccessModeArg {
    /// Read-write on a single node.
    SingleNodeWriter,
    /// Read-only on a single node.
    SingleNodeReaderOnly,
    /// Read-write by a single workload on a single node.
    SingleNodeSingleWriter,
    /// Read-write by several workloads on a single node.
    SingleNodeMultiWriter,
    /// Read-only on many nodes.
    MultiNodeReaderOnly,
    /// Read-only on many nodes with one writer.
    MultiNodeSingleWriter,
    /// Read-write on many nodes.
    MultiNodeMultiWriter,
}
