//! BDD step definitions for the controller service.

use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;
use vultr_csi::test_support::ScriptedStorage;
use vultr_csi::types::TOPOLOGY_REGION_KEY;
use vultr_csi::{CapacityRange, DeleteVolumeRequest, RequestContext, VolumeCapability, VolumeStatus};

use super::test_helpers::{ControllerContext, Outcome, parse_access_mode, writer_mount_request};
use crate::test_constants::{BYTES_PER_GIB, BYTES_PER_TIB};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Runtime {
    Runtime::new().unwrap_or_else(|err| panic!("tokio runtime should start: {err}"))
}

#[given("a controller for region \"{region}\"")]
fn controller_for_region(mut controller_context: ControllerContext, region: String) -> ControllerContext {
    controller_context.region = region;
    controller_context
}

#[given("a request named \"{name}\" with a single node writer mount")]
fn writer_mount(mut controller_context: ControllerContext, name: String) -> ControllerContext {
    controller_context.request = writer_mount_request(&name);
    controller_context
}

#[given("a request named \"{name}\" with access mode \"{mode}\"")]
fn request_with_mode(
    mut controller_context: ControllerContext,
    name: String,
    mode: String,
) -> ControllerContext {
    controller_context.request = writer_mount_request(&name);
    controller_context.request.volume_capabilities =
        vec![VolumeCapability::mount(parse_access_mode(&mode))];
    controller_context
}

#[given("the request requires {tib:u64} TiB")]
fn request_requires_tib(mut controller_context: ControllerContext, tib: u64) -> ControllerContext {
    controller_context.request.capacity_range = Some(CapacityRange {
        required_bytes: tib * BYTES_PER_TIB,
        limit_bytes: 0,
    });
    controller_context
}

#[given("new volumes become active on poll {poll:u32}")]
fn active_on_poll(controller_context: ControllerContext, poll: u32) -> ControllerContext {
    controller_context.storage.activate_on_poll(poll);
    controller_context
}

#[given("new volumes never become active")]
fn never_active(controller_context: ControllerContext) -> ControllerContext {
    controller_context
        .storage
        .script_statuses([VolumeStatus::Creating]);
    controller_context
}

#[given("a volume \"{id}\" named \"{name}\" of {size:u64} GiB exists")]
fn volume_exists(
    controller_context: ControllerContext,
    id: String,
    name: String,
    size: u64,
) -> ControllerContext {
    controller_context.storage.insert_volume(&id, &name, size);
    controller_context
}

#[given("volume deletion fails with \"{message}\"")]
fn deletion_fails(controller_context: ControllerContext, message: String) -> ControllerContext {
    controller_context.storage.fail_deletes(&message);
    controller_context
}

fn run_create(mut controller_context: ControllerContext) -> ControllerContext {
    let service = controller_context.service();
    let request = controller_context.request.clone();
    let result = runtime().block_on(async move {
        service
            .create_volume(&request, &RequestContext::new())
            .await
    });
    controller_context.outcomes.push(match result {
        Ok(response) => Outcome::Created(response),
        Err(err) => Outcome::failed(&err),
    });
    controller_context
}

#[when("the volume is created")]
fn create_volume(controller_context: ControllerContext) -> ControllerContext {
    run_create(controller_context)
}

#[when("the same request is sent twice")]
fn create_volume_twice(controller_context: ControllerContext) -> ControllerContext {
    run_create(run_create(controller_context))
}

fn run_delete(mut controller_context: ControllerContext, id: String) -> ControllerContext {
    let service = controller_context.service();
    let request = DeleteVolumeRequest { volume_id: id };
    let result = runtime().block_on(async move { service.delete_volume(&request).await });
    controller_context.outcomes.push(match result {
        Ok(_) => Outcome::Deleted,
        Err(err) => Outcome::failed(&err),
    });
    controller_context
}

#[when("volume \"{id}\" is deleted")]
fn delete_volume(controller_context: ControllerContext, id: String) -> ControllerContext {
    run_delete(controller_context, id)
}

#[when("a volume with no id is deleted")]
fn delete_without_id(controller_context: ControllerContext) -> ControllerContext {
    run_delete(controller_context, String::new())
}

fn created(controller_context: &ControllerContext) -> Result<&vultr_csi::Volume, StepError> {
    match controller_context.last_outcome() {
        Some(Outcome::Created(response)) => Ok(&response.volume),
        other => Err(StepError::Assertion(format!(
            "expected a created volume, got {other:?}"
        ))),
    }
}

#[then("the request succeeds")]
fn request_succeeds(controller_context: &ControllerContext) -> Result<(), StepError> {
    match controller_context.last_outcome() {
        Some(Outcome::Created(_) | Outcome::Deleted) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected success, got {other:?}"
        ))),
    }
}

#[then("the volume id is \"{id}\"")]
fn volume_id_is(controller_context: &ControllerContext, id: String) -> Result<(), StepError> {
    let volume = created(controller_context)?;
    if volume.volume_id == id {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected volume id {id}, got {}",
            volume.volume_id
        )))
    }
}

#[then("the capacity is {gib:u64} GiB")]
fn capacity_is(controller_context: &ControllerContext, gib: u64) -> Result<(), StepError> {
    let volume = created(controller_context)?;
    if volume.capacity_bytes == gib * BYTES_PER_GIB {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {gib} GiB, got {} bytes",
            volume.capacity_bytes
        )))
    }
}

#[then("the topology region is \"{region}\"")]
fn topology_region_is(
    controller_context: &ControllerContext,
    region: String,
) -> Result<(), StepError> {
    let volume = created(controller_context)?;
    let reported: Vec<&str> = volume
        .accessible_topology
        .iter()
        .filter_map(|topology| topology.segments.get(TOPOLOGY_REGION_KEY))
        .map(String::as_str)
        .collect();
    if reported == [region.as_str()] {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected topology region {region}, got {reported:?}"
        )))
    }
}

#[then("both responses are identical")]
fn responses_identical(controller_context: &ControllerContext) -> Result<(), StepError> {
    let [Outcome::Created(first), Outcome::Created(second)] = controller_context.outcomes.as_slice()
    else {
        return Err(StepError::Assertion(format!(
            "expected two created volumes, got {:?}",
            controller_context.outcomes
        )));
    };
    if first.volume.volume_id == second.volume.volume_id
        && first.volume.capacity_bytes == second.volume.capacity_bytes
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "responses differ: {first:?} vs {second:?}"
        )))
    }
}

#[then("the request fails with code \"{code}\"")]
fn fails_with_code(controller_context: &ControllerContext, code: String) -> Result<(), StepError> {
    match controller_context.last_outcome() {
        Some(Outcome::Failed { code: actual, .. }) if format!("{actual:?}") == code => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure with {code}, got {other:?}"
        ))),
    }
}

#[then("the error mentions \"{text}\"")]
fn error_mentions(controller_context: &ControllerContext, text: String) -> Result<(), StepError> {
    match controller_context.last_outcome() {
        Some(Outcome::Failed { message, .. }) if message.contains(&text) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected an error mentioning {text:?}, got {other:?}"
        ))),
    }
}

#[then("the backend create was called {count:u32} times")]
fn create_calls(controller_context: &ControllerContext, count: u32) -> Result<(), StepError> {
    let actual = controller_context.storage.create_calls();
    if actual == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} create calls, got {actual}"
        )))
    }
}

#[then("the backend status was polled {count:u32} times")]
fn status_polls(controller_context: &ControllerContext, count: u32) -> Result<(), StepError> {
    let actual = controller_context.storage.status_polls();
    if actual == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} status polls, got {actual}"
        )))
    }
}

#[then("the created volume was deleted")]
fn created_volume_deleted(controller_context: &ControllerContext) -> Result<(), StepError> {
    let storage: &ScriptedStorage = &controller_context.storage;
    if storage.delete_calls() == vec![String::from("vol-0001")] && storage.volume_count() == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected the abandoned volume to be deleted, deletes: {:?}",
            storage.delete_calls()
        )))
    }
}

#[then("the backend was not called")]
fn backend_not_called(controller_context: &ControllerContext) -> Result<(), StepError> {
    let storage = &controller_context.storage;
    if storage.lookup_calls() == 0 && storage.create_calls() == 0 && storage.delete_calls().is_empty()
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no backend calls, got {} lookups, {} creates, deletes {:?}",
            storage.lookup_calls(),
            storage.create_calls(),
            storage.delete_calls()
        )))
    }
}

#[then("no volumes remain")]
fn no_volumes_remain(controller_context: &ControllerContext) -> Result<(), StepError> {
    let remaining = controller_context.storage.volume_count();
    if remaining == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no volumes, {remaining} remain"
        )))
    }
}
