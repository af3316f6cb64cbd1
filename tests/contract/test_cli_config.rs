use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Contract tests for `sxscat config`

fn sxscat(config: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sxscat").unwrap();
    cmd.env("SXSCONFIGDIR", config.path());
    cmd
}

#[test]
fn test_config_path_respects_environment() {
    let config = TempDir::new().unwrap();

    let mut cmd = sxscat(&config);
    cmd.args(&["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config.path().to_str().unwrap()))
        .stdout(predicate::str::contains("config.json"));
}

#[test]
fn test_config_set_then_get() {
    let config = TempDir::new().unwrap();

    let mut cmd = sxscat(&config);
    cmd.args(&["config", "set", "download_progress", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated"));

    // `false` is stored as a boolean, not the string "false"
    let mut cmd = sxscat(&config);
    cmd.args(&["config", "get", "download_progress"])
        .assert()
        .success()
        .stdout(predicate::str::diff("false\n"));
}

#[test]
fn test_config_set_keeps_unparseable_values_as_strings() {
    let config = TempDir::new().unwrap();

    let mut cmd = sxscat(&config);
    cmd.args(&["config", "set", "annex_dir", "/data/annex"])
        .assert()
        .success();

    let mut cmd = sxscat(&config);
    cmd.args(&["config", "get", "annex_dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"/data/annex\""));
}

#[test]
fn test_config_get_missing_key_fails() {
    let config = TempDir::new().unwrap();

    let mut cmd = sxscat(&config);
    cmd.args(&["config", "get", "no_such_key"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("configuration key 'no_such_key'"));
}

#[test]
fn test_config_list_shows_all_keys() {
    let config = TempDir::new().unwrap();

    let mut cmd = sxscat(&config);
    cmd.args(&["config", "set", "download_progress", "false"])
        .assert()
        .success();
    let mut cmd = sxscat(&config);
    cmd.args(&["config", "set", "annex_dir", "/data/annex"])
        .assert()
        .success();

    let mut cmd = sxscat(&config);
    cmd.args(&["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("download_progress = false"))
        .stdout(predicate::str::contains("annex_dir = \"/data/annex\""));
}

#[test]
fn test_config_defaults_to_list() {
    let config = TempDir::new().unwrap();

    let mut cmd = sxscat(&config);
    cmd.args(&["config", "set", "download_progress", "true"])
        .assert()
        .success();

    let mut cmd = sxscat(&config);
    cmd.arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("download_progress = true"));
}
