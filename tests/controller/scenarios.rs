//! BDD scenarios for the controller service.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ControllerContext, controller_context};

#[scenario(
    path = "tests/features/create_volume.feature",
    name = "Provision a default-sized volume that becomes active on the third poll"
)]
fn scenario_provision_default_volume(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/create_volume.feature",
    name = "Return the existing volume when the name is reused"
)]
fn scenario_existing_volume(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/create_volume.feature",
    name = "Repeating a create returns the same volume"
)]
fn scenario_repeated_create(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/create_volume.feature",
    name = "Reject a capacity above the largest volume"
)]
fn scenario_capacity_too_large(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/create_volume.feature",
    name = "Reject an unsupported access mode"
)]
fn scenario_unsupported_access_mode(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/create_volume.feature",
    name = "Give up on a volume that never becomes active"
)]
fn scenario_never_active(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/create_volume.feature",
    name = "Reject a non-numeric region code"
)]
fn scenario_non_numeric_region(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/delete_volume.feature",
    name = "Delete an existing volume"
)]
fn scenario_delete_existing(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/delete_volume.feature",
    name = "Deleting a missing volume succeeds"
)]
fn scenario_delete_missing(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/delete_volume.feature",
    name = "Reject an empty volume id"
)]
fn scenario_delete_empty_id(controller_context: ControllerContext) {
    let _ = controller_context;
}

#[scenario(
    path = "tests/features/delete_volume.feature",
    name = "Report backend delete failures as internal"
)]
fn scenario_delete_failure(controller_context: ControllerContext) {
    let _ = controller_context;
}
