use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Contract tests for `sxscat fetch`
/// Every run is offline against seeded cache files, so no network is needed

fn seed_catalog(cache_dir: &Path, tag: &str, catalog: &serde_json::Value) {
    fs::create_dir_all(cache_dir).unwrap();
    let path = cache_dir.join(format!("simulations_{tag}.json.gz"));
    let file = fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(catalog.to_string().as_bytes())
        .unwrap();
    encoder.finish().unwrap();
}

fn sample_catalog() -> serde_json::Value {
    json!({
        "SXS:BBH:0001": {
            "object_types": "BHBH",
            "reference_mass_ratio": 1.5,
            "reference_eccentricity": 0.0001,
            "keywords": []
        },
        "SXS:BHNS:0001": {
            "object_types": "BHNS",
            "reference_mass_ratio": 6.0,
            "reference_eccentricity": 0.01,
            "keywords": []
        }
    })
}

fn sxscat(cache: &TempDir, config: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sxscat").unwrap();
    cmd.env("SXSCACHEDIR", cache.path())
        .env("SXSCONFIGDIR", config.path());
    cmd
}

#[test]
fn test_fetch_offline_uses_newest_cached_tag() {
    let cache = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    seed_catalog(cache.path(), "v2.0.0", &sample_catalog());
    seed_catalog(cache.path(), "v3.0.0", &sample_catalog());

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["fetch", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Loaded catalog v3.0.0 with 2 simulations",
        ))
        .stdout(predicate::str::contains("Cached at"));
}

#[test]
fn test_fetch_offline_with_explicit_tag() {
    let cache = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    seed_catalog(cache.path(), "v2.0.0", &sample_catalog());
    seed_catalog(cache.path(), "v3.0.0", &sample_catalog());

    // Tags normalize to the `v<version>` form, so `2.0.0` works too
    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["fetch", "--tag", "2.0.0", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Loaded catalog v2.0.0 with 2 simulations",
        ));
}

#[test]
fn test_fetch_offline_with_empty_cache_fails() {
    let cache = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["fetch", "--offline"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_fetch_offline_with_uncached_tag_fails() {
    let cache = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    seed_catalog(cache.path(), "v3.0.0", &sample_catalog());

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["fetch", "--tag", "v9.9.9", "--offline"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("downloads are turned off"));
}

#[test]
fn test_fetch_rejects_malformed_tag() {
    let cache = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    seed_catalog(cache.path(), "v3.0.0", &sample_catalog());

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["fetch", "--tag", "not-a-version", "--offline"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_fetch_json_output() {
    let cache = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    seed_catalog(cache.path(), "v3.0.0", &sample_catalog());

    let mut cmd = sxscat(&cache, &config);
    let output = cmd
        .args(&["fetch", "--offline", "--quiet", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["status"], "success");
    assert_eq!(response["tag"], "v3.0.0");
    assert_eq!(response["simulations"], 2);
    let cache_path = response["cache_path"].as_str().unwrap();
    assert!(cache_path.ends_with("simulations_v3.0.0.json.gz"));
}

#[test]
fn test_help_lists_all_commands() {
    let mut cmd = Command::cargo_bin("sxscat").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("sxscat").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
