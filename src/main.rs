//! Binary entry point for the `vultr-csi` CLI.

mod cli;

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tonic::Code;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{AccessModeArg, Cli, Command, CreateVolumeCommand, DeleteVolumeCommand};
use vultr_csi::{
    AccessMode, AccessType, CapacityRange, ConfigError, ControllerError, ControllerOperation,
    ControllerService, CreateVolumeRequest, DeleteVolumeRequest, DriverConfig, RequestContext,
    VolumeCapability, VultrBackend, VultrBackendError,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("backend error: {0}")]
    Backend(#[from] VultrBackendError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("could not render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    const fn code(&self) -> Code {
        match self {
            Self::Config(_) | Self::Backend(_) => Code::FailedPrecondition,
            Self::Controller(err) => err.code(),
            Self::Output(_) => Code::Internal,
        }
    }
}

/// One row of the `capabilities` listing.
#[derive(Debug, Serialize)]
struct MethodSupport {
    method: &'static str,
    supported: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let exit_code = match dispatch(cli.command).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}

async fn dispatch(command: Command) -> Result<(), CliError> {
    match command {
        Command::CreateVolume(args) => exec_create(args).await,
        Command::DeleteVolume(args) => exec_delete(args).await,
        Command::Capabilities => write_json(&capabilities()),
    }
}

fn controller() -> Result<ControllerService<VultrBackend>, CliError> {
    let config = DriverConfig::load_without_cli_args()?;
    let backend = VultrBackend::new(&config)?;
    Ok(ControllerService::from_config(backend, &config))
}

async fn exec_create(args: CreateVolumeCommand) -> Result<(), CliError> {
    let controller = controller()?;
    let request = create_request(&args);
    let context = request_context(args.timeout_secs, interrupt_token());
    let response = controller.create_volume(&request, &context).await?;
    write_json(&response)
}

async fn exec_delete(args: DeleteVolumeCommand) -> Result<(), CliError> {
    let controller = controller()?;
    let request = DeleteVolumeRequest {
        volume_id: args.volume_id,
    };
    let response = controller.delete_volume(&request).await?;
    write_json(&response)
}

/// Cancels the returned token when the process receives Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let watcher = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling the request");
            watcher.cancel();
        }
    });
    token
}

fn request_context(timeout_secs: Option<u64>, token: CancellationToken) -> RequestContext {
    let context = RequestContext::new().with_cancellation(token);
    match timeout_secs {
        Some(secs) => context.with_timeout(Duration::from_secs(secs)),
        None => context,
    }
}

fn create_request(args: &CreateVolumeCommand) -> CreateVolumeRequest {
    let mode = access_mode(args.access_mode);
    let capability = if args.block {
        VolumeCapability::block(mode)
    } else {
        VolumeCapability {
            access_mode: Some(mode),
            access_type: Some(AccessType::Mount {
                fs_type: args.fs_type.clone().unwrap_or_default(),
                mount_flags: Vec::new(),
            }),
        }
    };
    let capacity_range = match (args.required_bytes, args.limit_bytes) {
        (None, None) => None,
        (required, limit) => Some(CapacityRange {
            required_bytes: required.unwrap_or(0),
            limit_bytes: limit.unwrap_or(0),
        }),
    };

    CreateVolumeRequest {
        name: args.name.clone(),
        volume_capabilities: vec![capability],
        capacity_range,
    }
}

const fn access_mode(arg: AccessModeArg) -> AccessMode {
    match arg {
        AccessModeArg::SingleNodeWriter => AccessMode::SingleNodeWriter,
        AccessModeArg::SingleNodeReaderOnly => AccessMode::SingleNodeReaderOnly,
        AccessModeArg::SingleNodeSingleWriter => AccessMode::SingleNodeSingleWriter,
        AccessModeArg::SingleNodeMultiWriter => AccessMode::SingleNodeMultiWriter,
        AccessModeArg::MultiNodeReaderOnly => AccessMode::MultiNodeReaderOnly,
        AccessModeArg::MultiNodeSingleWriter => AccessMode::MultiNodeSingleWriter,
        AccessModeArg::MultiNodeMultiWriter => AccessMode::MultiNodeMultiWriter,
    }
}

fn capabilities() -> Vec<MethodSupport> {
    ControllerOperation::ALL
        .iter()
        .map(|operation| MethodSupport {
            method: operation.method_name(),
            supported: operation.is_supported(),
        })
        .collect()
}

fn write_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    writeln!(io::stdout(), "{rendered}").ok();
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "error [{:?}]: {err}", err.code()).ok();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
