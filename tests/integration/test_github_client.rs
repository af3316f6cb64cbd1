use mockito::Server;
use serde_json::json;
use tokio_test::assert_err;

use sxscatalog::services::github::{GitHubClient, GitHubError};

/// Integration tests for the GitHub releases client, against a local mock
/// server

fn client_for(server: &Server) -> GitHubClient {
    GitHubClient::with_releases_url(format!("{}/releases", server.url()))
}

#[tokio::test]
async fn test_latest_release_picks_newest_published() {
    let mut server = Server::new_async().await;
    // Out of order on purpose; drafts carry no published_at
    let releases = json!([
        {"tag_name": "v2.0.0", "published_at": "2024-01-15T00:00:00Z", "name": "Second release"},
        {"tag_name": "v9.9.9", "published_at": null, "draft": true},
        {"tag_name": "v3.0.0", "published_at": "2024-08-04T12:00:00Z", "name": "Third release"},
    ]);
    let mock = server
        .mock("GET", "/releases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(releases.to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let release = client.latest_release().await.unwrap();
    assert_eq!(release.tag_name, "v3.0.0");
    assert!(release.published_at.is_some());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_releases_parses_all_entries() {
    let mut server = Server::new_async().await;
    let releases = json!([
        {"tag_name": "v1.0.0", "published_at": "2023-05-01T00:00:00Z"},
        {"tag_name": "v2.0.0", "published_at": "2024-01-15T00:00:00Z", "prerelease": true},
    ]);
    let _mock = server
        .mock("GET", "/releases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(releases.to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let releases = client.releases().await.unwrap();
    assert_eq!(releases.len(), 2);
    assert_eq!(releases[0].tag_name, "v1.0.0");
    assert!(releases[1].prerelease);
}

#[tokio::test]
async fn test_missing_endpoint_is_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/releases")
        .with_status(404)
        .create_async()
        .await;

    let client = client_for(&server);
    let error = assert_err!(client.releases().await);
    assert!(matches!(error, GitHubError::NotFound(_)));
}

#[tokio::test]
async fn test_forbidden_is_rate_limited() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/releases")
        .with_status(403)
        .create_async()
        .await;

    let client = client_for(&server);
    let error = assert_err!(client.releases().await);
    assert!(matches!(error, GitHubError::RateLimited));
}

#[tokio::test]
async fn test_only_drafts_means_no_releases() {
    let mut server = Server::new_async().await;
    let releases = json!([
        {"tag_name": "v9.9.9", "published_at": null, "draft": true},
    ]);
    let _mock = server
        .mock("GET", "/releases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(releases.to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let error = client.latest_release().await.unwrap_err();
    assert!(matches!(error, GitHubError::NoReleases));
}

#[tokio::test]
async fn test_invalid_body_is_a_parse_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/releases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not json at all")
        .create_async()
        .await;

    let client = client_for(&server);
    let error = client.releases().await.unwrap_err();
    assert!(matches!(error, GitHubError::ParseError(_)));
}
