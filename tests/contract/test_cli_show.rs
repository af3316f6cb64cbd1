use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Contract tests for `sxscat show`

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

fn seeded() -> (TempDir, TempDir) {
    let cache = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    seed_catalog(cache.path(), "v3.0.0", &sample_catalog());
    (cache, config)
}

#[test]
fn test_show_prints_metadata_lines() {
    let (cache, config) = seeded();

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["show", "SXS:BBH:0001", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("object_types = \"BHBH\""))
        .stdout(predicate::str::contains("reference_mass_ratio = 1.5"));
}

#[test]
fn test_show_strips_version_and_lev_suffixes() {
    let (cache, config) = seeded();

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["show", "SXS:BBH:0001v2.0/Lev5", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("object_types = \"BHBH\""));
}

#[test]
fn test_show_json_output() {
    let (cache, config) = seeded();

    let mut cmd = sxscat(&cache, &config);
    let output = cmd
        .args(&["show", "SXS:BBH:0001", "--offline", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(metadata["object_types"], "BHBH");
    assert_eq!(metadata["reference_mass_ratio"], 1.5);
}

#[test]
fn test_show_unknown_simulation_fails() {
    let (cache, config) = seeded();

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["show", "SXS:BBH:9999", "--offline"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("simulation 'SXS:BBH:9999'"));
}

#[test]
fn test_show_rejects_malformed_id() {
    let (cache, config) = seeded();

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["show", "not-an-id", "--offline"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_show_local_simulation_by_directory_key() {
    let (cache, config) = seeded();

    // Local catalogs key unpublished runs by annex-relative path
    let local = json!({
        "Incoming/q5": {
            "object_types": "BHBH",
            "reference_mass_ratio": 5.0,
            "lev_numbers": [2, 3]
        }
    });
    fs::write(
        cache.path().join("local_simulations.json"),
        serde_json::to_string_pretty(&local).unwrap(),
    )
    .unwrap();

    let mut cmd = sxscat(&cache, &config);
    cmd.args(&["show", "Incoming/q5", "--local", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reference_mass_ratio = 5"))
        .stdout(predicate::str::contains("lev_numbers = [2,3]"));
}
