use mockito::Server;
use std::fs;
use tempfile::TempDir;

use sxscatalog::services::downloader::{DownloadOptions, Downloader, IfNewer};

/// Integration tests for the streaming downloader, against a local mock
/// server

#[tokio::test]
async fn test_download_to_file() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/data/simulations.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{\"SXS:BBH:0001\": {}}")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("simulations.json");
    let downloader = Downloader::new();
    let url = format!("{}/data/simulations.json", server.url());
    let written = downloader
        .download_file(&url, &target, &DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(written, target);
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "{\"SXS:BBH:0001\": {}}"
    );
    // The staging file is renamed away on success
    assert!(!dir.path().join("simulations.json.part").exists());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_download_into_directory_uses_url_path() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/data/v3.0.0/simulations.json")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = Downloader::new();
    let url = format!("{}/data/v3.0.0/simulations.json", server.url());
    let written = downloader
        .download_file(&url, dir.path(), &DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(written, dir.path().join("data/v3.0.0/simulations.json"));
    assert!(written.exists());
}

#[tokio::test]
async fn test_pointer_file_redirects_to_real_file() {
    let mut server = Server::new_async().await;
    let pointer_body = format!("{}/real/file.json\n", server.url());
    let pointer = server
        .mock("GET", "/pointer.json")
        .with_status(200)
        .with_body(pointer_body)
        .create_async()
        .await;
    let real = server
        .mock("GET", "/real/file.json")
        .with_status(200)
        .with_body("real contents")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("file.json");
    let downloader = Downloader::new();
    let url = format!("{}/pointer.json", server.url());
    downloader
        .download_file(&url, &target, &DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "real contents");
    pointer.assert_async().await;
    real.assert_async().await;
}

#[tokio::test]
async fn test_skips_download_when_local_file_is_newer() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/file.json")
        .with_status(200)
        .with_header("last-modified", "Wed, 01 Jan 2020 00:00:00 GMT")
        .with_body("remote contents")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("file.json");
    fs::write(&target, "local contents").unwrap();

    let downloader = Downloader::new();
    let url = format!("{}/file.json", server.url());
    let written = downloader
        .download_file(&url, &target, &DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(written, target);
    assert_eq!(fs::read_to_string(&target).unwrap(), "local contents");
}

#[tokio::test]
async fn test_always_overwrites_newer_local_file() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/file.json")
        .with_status(200)
        .with_header("last-modified", "Wed, 01 Jan 2020 00:00:00 GMT")
        .with_body("remote contents")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("file.json");
    fs::write(&target, "local contents").unwrap();

    let options = DownloadOptions {
        progress: false,
        if_newer: IfNewer::Always,
    };
    let downloader = Downloader::new();
    let url = format!("{}/file.json", server.url());
    downloader
        .download_file(&url, &target, &options)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "remote contents");
}

#[tokio::test]
async fn test_missing_remote_file_fails_cleanly() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/gone.json")
        .with_status(404)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("gone.json");
    let downloader = Downloader::new();
    let url = format!("{}/gone.json", server.url());
    let result = downloader
        .download_file(&url, &target, &DownloadOptions::default())
        .await;

    assert!(result.is_err());
    assert!(!target.exists());
    // No staging leftovers either
    let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftovers.is_empty());
}
