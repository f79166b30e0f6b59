//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn cli_without_arguments_prints_help() {
    let mut cmd = cargo_bin_cmd!("vultr-csi");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("create-volume"));
}

#[test]
fn capabilities_lists_supported_methods() {
    let mut cmd = cargo_bin_cmd!("vultr-csi");
    cmd.arg("capabilities")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"method\": \"CreateVolume\""))
        .stdout(predicate::str::contains("\"method\": \"ListSnapshots\""));
}

#[test]
fn delete_with_empty_id_is_rejected_before_any_request() {
    let mut cmd = cargo_bin_cmd!("vultr-csi");
    cmd.env("VULTR_API_KEY", "test-key")
        .env("VULTR_REGION", "1")
        .env("VULTR_API_BASE_URL", "http://127.0.0.1:9")
        .args(["delete-volume", "--volume-id", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error [InvalidArgument]: DeleteVolume Volume ID is missing",
        ));
}

#[test]
fn create_rejects_unsupported_access_mode() {
    let mut cmd = cargo_bin_cmd!("vultr-csi");
    cmd.env("VULTR_API_KEY", "test-key")
        .env("VULTR_REGION", "1")
        .env("VULTR_API_BASE_URL", "http://127.0.0.1:9")
        .args([
            "create-volume",
            "--name",
            "vol3",
            "--access-mode",
            "multi-node-reader-only",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error [InvalidArgument]"))
        .stderr(predicate::str::contains("not compatible"));
}

#[test]
fn missing_configuration_is_reported() {
    let mut cmd = cargo_bin_cmd!("vultr-csi");
    cmd.env_remove("VULTR_API_KEY")
        .env_remove("VULTR_REGION")
        .env("VULTR_CSI_CONFIG_PATH", "/nonexistent/vultr-csi.toml")
        .args(["delete-volume", "--volume-id", "vol-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error [FailedPrecondition]"));
}
