//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: environment/defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use cnstd_test_support::write_model_bundle;
use httpmock::prelude::*;
use predicates::prelude::*;

/// `cnstd` run from `home` with `home` as both `$HOME` and config root.
fn cnstd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cnstd").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("CNSTD_HOME")
        .env_remove("CNOCR_HOME")
        .env_remove("CNSTD_REPO_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_xdg_config(home: &Path, content: &str) {
    let dir = home.join(".config/cnstd");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), content).unwrap();
}

#[test]
fn test_default_models_dir_under_home() {
    let home = tempfile::tempdir().unwrap();
    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".cnstd").and(predicate::str::contains("1.2")));
}

#[test]
fn test_project_config_sets_models_dir() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".cnstd.toml"),
        "[models]\ndir = '/srv/project-models'\n",
    )
    .unwrap();

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/project-models"));
}

#[test]
fn test_project_config_found_from_subdirectory() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".cnstd.toml"),
        "[models]\ndir = '/srv/project-models'\n",
    )
    .unwrap();
    let nested = home.path().join("work/deeper");
    fs::create_dir_all(&nested).unwrap();

    cnstd(home.path())
        .current_dir(&nested)
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/project-models"));
}

#[test]
fn test_data_dir_config_uses_model_version() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".cnstd.toml"),
        "[general]\ndata_dir = '/srv/cnstd-data'\n",
    )
    .unwrap();

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/cnstd-data/1.2"));
}

#[test]
fn test_project_config_overrides_xdg() {
    let home = tempfile::tempdir().unwrap();
    write_xdg_config(home.path(), "[models]\ndir = '/srv/xdg-models'\n");
    fs::write(
        home.path().join(".cnstd.toml"),
        "[models]\ndir = '/srv/project-models'\n",
    )
    .unwrap();

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/project-models"));
}

#[test]
fn test_xdg_config_applies_without_project_config() {
    let home = tempfile::tempdir().unwrap();
    write_xdg_config(home.path(), "[models]\ndir = '/srv/xdg-models'\n");

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/xdg-models"));
}

#[test]
fn test_cli_overrides_project_config() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".cnstd.toml"),
        "[models]\ndir = '/srv/project-models'\n",
    )
    .unwrap();

    cnstd(home.path())
        .args(["--models-dir", "/srv/cli-models", "models", "path"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("/srv/cli-models")
                .and(predicate::str::contains("project-models").not()),
        );
}

#[test]
fn test_invalid_config_value_warns() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".cnstd.toml"),
        "[models]\nbackbone = 'db_vgg'\n",
    )
    .unwrap();

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: models.backbone"));
}

#[test]
fn test_malformed_config_warns_and_continues() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".cnstd.toml"), "[models\n").unwrap();

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn test_config_log_file_created() {
    let home = tempfile::tempdir().unwrap();
    let log = home.path().join("logs/cnstd.log");
    fs::write(
        home.path().join(".cnstd.toml"),
        format!(
            "[logging]\nfile = '{}'\nfile_level = 'debug'\n",
            log.display()
        ),
    )
    .unwrap();

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success();

    assert!(log.exists());
}

#[test]
fn test_cli_log_file_receives_records() {
    let home = tempfile::tempdir().unwrap();
    let log = home.path().join("cli.log");
    let models = home.path().join("models");

    cnstd(home.path())
        .arg("-vv")
        .arg("--log-file")
        .arg(&log)
        .arg("--models-dir")
        .arg(&models)
        .args(["models", "path"])
        .assert()
        .success();

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("Models directory overridden"));
}

#[test]
fn test_invalid_config_device_falls_back_to_cpu() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".cnstd.toml"),
        "[inference]\ndevice = 'tpu'\n",
    )
    .unwrap();

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: inference.device"));
}

#[test]
fn test_config_diagnostics_reach_console_log() {
    let home = tempfile::tempdir().unwrap();
    // Found during the upward search but cannot be read as a file.
    fs::create_dir(home.path().join(".cnstd.toml")).unwrap();

    cnstd(home.path())
        .args(["-vv", "models", "path"])
        .assert()
        .success()
        .stderr(
            predicate::str::contains("Loading project config")
                .and(predicate::str::contains("Failed to read config file")),
        );
}

#[test]
fn test_unreadable_config_warns_at_default_level() {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir(home.path().join(".cnstd.toml")).unwrap();

    cnstd(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stderr(
            predicate::str::contains("Failed to read config file")
                .and(predicate::str::contains("Loading project config").not()),
        );
}

#[test]
fn test_models_fetch_defaults_to_configured_backbone() {
    let home = tempfile::tempdir().unwrap();
    let bundle = home.path().join("bundle.zip");
    write_model_bundle(&bundle, "db_resnet18", "cnstd-v1.2-db_resnet18-0029.params").unwrap();
    let bundle_bytes = fs::read(&bundle).unwrap();

    let server = MockServer::start();
    let backbone = server.mock(|when, then| {
        when.method(GET).path("/db_resnet18.zip");
        then.status(200).body(&bundle_bytes);
    });

    fs::write(
        home.path().join(".cnstd.toml"),
        "[models]\nbackbone = 'db_resnet18'\n",
    )
    .unwrap();
    let models = home.path().join("models");

    cnstd(home.path())
        .env("CNSTD_REPO_URL", server.base_url())
        .arg("--models-dir")
        .arg(&models)
        .args(["models", "fetch", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db_resnet18"));

    // Any other bundle request would 404 and fail the command.
    backbone.assert_hits(1);
    assert!(models
        .join("db_resnet18/cnstd-v1.2-db_resnet18-0029.params")
        .exists());
    assert!(!models.join("db_resnet34").exists());
}
