use flate2::write::GzEncoder;
use flate2::Compression;
use mockito::Server;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

use sxscatalog::services::catalog::{read_catalog_file, CatalogClient, LoadOptions};
use sxscatalog::utils::error::SxsError;

/// End-to-end tests for the catalog client: release resolution, download,
/// gzip caching, and the local overlay, all against a local mock server

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
            "DOI_versions": ["SXS:BBH:0001v2.0"],
            "keywords": []
        },
        "SXS:BHNS:0001": {
            "object_types": "BHNS",
            "reference_mass_ratio": 6.0,
            "keywords": []
        }
    })
}

fn releases_body() -> String {
    json!([
        {"tag_name": "v2.0.0", "published_at": "2024-01-15T00:00:00Z"},
        {"tag_name": "v3.0.0", "published_at": "2024-08-04T12:00:00Z"},
    ])
    .to_string()
}

fn client_for(server: &Server, cache_dir: &Path) -> CatalogClient {
    CatalogClient::with_endpoints(
        format!("{}/releases", server.url()),
        format!("{}/data/{{tag}}/simulations.json", server.url()),
        cache_dir.to_path_buf(),
    )
}

fn quiet() -> LoadOptions {
    LoadOptions {
        show_progress: false,
        ..LoadOptions::default()
    }
}

fn offline() -> LoadOptions {
    LoadOptions {
        download: Some(false),
        ..quiet()
    }
}

#[tokio::test]
async fn test_load_downloads_and_caches_latest_release() {
    let mut server = Server::new_async().await;
    let releases = server
        .mock("GET", "/releases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(releases_body())
        .create_async()
        .await;
    let raw = server
        .mock("GET", "/data/v3.0.0/simulations.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(sample_catalog().to_string())
        .create_async()
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = client_for(&server, cache.path());
    let simulations = client.load(&quiet()).await.unwrap();

    assert_eq!(simulations.len(), 2);
    assert_eq!(simulations.tag.as_deref(), Some("v3.0.0"));
    assert!(simulations.published_at.is_some());
    assert!(simulations.contains_key("SXS:BBH:0001"));

    // The catalog is cached gzipped, keyed by tag, with no staging leftovers
    let cache_path = client.cache_path("v3.0.0");
    assert!(cache_path.exists());
    let reread = read_catalog_file(&cache_path).unwrap();
    assert_eq!(reread.len(), 2);
    let entries: Vec<_> = fs::read_dir(cache.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);

    releases.assert_async().await;
    raw.assert_async().await;
}

#[tokio::test]
async fn test_load_memoizes_until_reload() {
    let mut server = Server::new_async().await;
    let releases = server
        .mock("GET", "/releases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(releases_body())
        .expect(2)
        .create_async()
        .await;
    let raw = server
        .mock("GET", "/data/v3.0.0/simulations.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(sample_catalog().to_string())
        .expect(1)
        .create_async()
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = client_for(&server, cache.path());

    let first = client.load(&quiet()).await.unwrap();
    // Second load is served from the memo without touching the network
    let second = client.load(&quiet()).await.unwrap();
    assert_eq!(first.len(), second.len());

    // reload drops the memo: the release query runs again, but the cached
    // file spares the download
    let third = client.reload(&quiet()).await.unwrap();
    assert_eq!(third.tag.as_deref(), Some("v3.0.0"));

    releases.assert_async().await;
    raw.assert_async().await;
}

#[tokio::test]
async fn test_explicit_tag_skips_release_query() {
    let mut server = Server::new_async().await;
    // No releases mock: resolving an explicit tag must not call GitHub
    let raw = server
        .mock("GET", "/data/v2.0.0/simulations.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(sample_catalog().to_string())
        .create_async()
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = client_for(&server, cache.path());
    let options = LoadOptions {
        tag: Some("2.0.0".to_string()),
        ..quiet()
    };
    let simulations = client.load(&options).await.unwrap();

    assert_eq!(simulations.tag.as_deref(), Some("v2.0.0"));
    assert!(simulations.published_at.is_none());
    raw.assert_async().await;
}

#[tokio::test]
async fn test_network_failure_falls_back_to_cached_tag() {
    let mut server = Server::new_async().await;
    let _releases = server
        .mock("GET", "/releases")
        .with_status(500)
        .create_async()
        .await;

    let cache = TempDir::new().unwrap();
    seed_catalog(cache.path(), "v1.2.3", &sample_catalog());

    let mut client = client_for(&server, cache.path());
    let simulations = client.load(&quiet()).await.unwrap();

    assert_eq!(simulations.tag.as_deref(), Some("v1.2.3"));
    assert_eq!(simulations.len(), 2);
}

#[tokio::test]
async fn test_offline_with_empty_cache_is_not_found() {
    let cache = TempDir::new().unwrap();
    let mut client = CatalogClient::with_cache_dir(cache.path().to_path_buf());
    let error = client.load(&offline()).await.unwrap_err();
    assert!(matches!(error, SxsError::NotFound(_)));
}

#[tokio::test]
async fn test_forced_download_failure_does_not_fall_back() {
    let mut server = Server::new_async().await;
    let _releases = server
        .mock("GET", "/releases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(releases_body())
        .create_async()
        .await;
    let _raw = server
        .mock("GET", "/data/v3.0.0/simulations.json")
        .with_status(404)
        .create_async()
        .await;

    let cache = TempDir::new().unwrap();
    // A cached file exists, but download: Some(true) must not use it
    seed_catalog(cache.path(), "v1.2.3", &sample_catalog());

    let mut client = client_for(&server, cache.path());
    let options = LoadOptions {
        download: Some(true),
        ..quiet()
    };
    let error = client.load(&options).await.unwrap_err();

    assert!(matches!(error, SxsError::Download(_)));
    assert!(error.to_string().contains("does tag v3.0.0 exist?"));
}

#[tokio::test]
async fn test_annex_overlay_preserves_published_doi_versions() {
    let cache = TempDir::new().unwrap();
    seed_catalog(cache.path(), "v3.0.0", &sample_catalog());

    // An annex copy of a published simulation, plus nothing else
    let annex = TempDir::new().unwrap();
    let sim = annex.path().join("q1");
    fs::create_dir_all(sim.join("Lev2")).unwrap();
    fs::write(
        sim.join("common-metadata.txt"),
        "alternative-names = SXS:BBH:0001\n",
    )
    .unwrap();
    fs::write(
        sim.join("Lev2").join("metadata.txt"),
        "simulation-name = q1\nobject-types = BHBH\n",
    )
    .unwrap();

    let mut client = CatalogClient::with_cache_dir(cache.path().to_path_buf());
    let options = LoadOptions {
        annex_dir: Some(annex.path().to_path_buf()),
        ..offline()
    };
    let simulations = client.load(&options).await.unwrap();

    let metadata = simulations.get("SXS:BBH:0001").unwrap();
    // Local scan data is present, published DOI_versions survive the merge
    assert_eq!(metadata.get("lev_numbers"), Some(&json!([2])));
    assert_eq!(
        metadata.get("DOI_versions"),
        Some(&json!(["SXS:BBH:0001v2.0"]))
    );

    let local_path = cache.path().join("local_simulations.json");
    assert!(local_path.exists());
    assert_eq!(simulations.source_path.as_deref(), Some(local_path.as_path()));
}

#[tokio::test]
async fn test_read_catalog_file_rejects_plain_json() {
    let cache = TempDir::new().unwrap();
    let path = cache.path().join("simulations_v1.0.0.json.gz");
    fs::write(&path, sample_catalog().to_string()).unwrap();

    let error = read_catalog_file(&path).unwrap_err();
    assert!(matches!(error, SxsError::Validation(_)));
}
