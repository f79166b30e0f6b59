//! Shared fixtures and helpers for controller BDD scenarios.

use rstest::fixture;
use tonic::Code;
use vultr_csi::test_support::ScriptedStorage;
use vultr_csi::{
    AccessMode, ControllerError, ControllerService, CreateVolumeRequest, CreateVolumeResponse,
    PollPolicy, VolumeCapability,
};

use crate::test_constants::{POLL_ATTEMPTS, POLL_INTERVAL};

#[derive(Clone, Debug)]
pub enum Outcome {
    Created(CreateVolumeResponse),
    Deleted,
    Failed { code: Code, message: String },
}

impl Outcome {
    pub fn failed(err: &ControllerError) -> Self {
        Self::Failed {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControllerContext {
    pub storage: ScriptedStorage,
    pub region: String,
    pub request: CreateVolumeRequest,
    pub outcomes: Vec<Outcome>,
}

impl ControllerContext {
    pub fn service(&self) -> ControllerService<ScriptedStorage> {
        ControllerService::new(self.storage.clone(), self.region.clone())
            .with_poll_policy(PollPolicy::new(POLL_ATTEMPTS, POLL_INTERVAL))
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.outcomes.last()
    }
}

#[fixture]
pub fn controller_context() -> ControllerContext {
    ControllerContext {
        storage: ScriptedStorage::new(),
        region: String::new(),
        request: CreateVolumeRequest::default(),
        outcomes: Vec::new(),
    }
}

pub fn writer_mount_request(name: &str) -> CreateVolumeRequest {
    CreateVolumeRequest {
        name: name.to_owned(),
        volume_capabilities: vec![VolumeCapability::mount(AccessMode::SingleNodeWriter)],
        capacity_range: None,
    }
}

pub fn parse_access_mode(raw: &str) -> AccessMode {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .unwrap_or_else(|err| panic!("unknown access mode {raw}: {err}"))
}
