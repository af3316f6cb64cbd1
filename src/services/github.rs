use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// GitHub releases endpoint for the published catalog data
const RELEASES_URL: &str =
    "https://api.github.com/repos/sxs-collaboration/sxscatalogdata/releases";

/// GitHub releases API client for the catalog data repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// HTTP client for API requests
    client: Client,
    /// Releases endpoint URL (configurable for testing)
    releases_url: String,
    /// User agent string for requests
    user_agent: String,
}

/// One release of the catalog data repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Git tag of the release, e.g. `v3.0.0`
    pub tag_name: String,
    /// Publication timestamp; absent for unpublished drafts
    pub published_at: Option<DateTime<Utc>>,
    /// Human-readable release title
    pub name: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
}

/// GitHub client errors
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    /// HTTP request failed
    #[error("GitHub request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Endpoint or resource not found
    #[error("GitHub resource not found: {0}")]
    NotFound(String),

    /// Rate limiting (403 or 429)
    #[error("Rate limited by GitHub; set GITHUB_TOKEN to raise the limit")]
    RateLimited,

    /// The repository has no published releases
    #[error("No published releases found")]
    NoReleases,

    /// Response parsing failed
    #[error("Failed to parse GitHub response: {0}")]
    ParseError(String),
}

impl GitHubClient {
    /// Create a client for the public catalog data repository
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            releases_url: RELEASES_URL.to_string(),
            user_agent: format!("sxscatalog/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Create a client with a custom releases URL (for testing)
    pub fn with_releases_url(releases_url: String) -> Self {
        Self {
            client: Client::new(),
            releases_url,
            user_agent: format!("sxscatalog/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// List the releases of the catalog data repository
    pub async fn releases(&self) -> Result<Vec<Release>, GitHubError> {
        let mut request = self
            .client
            .get(&self.releases_url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/vnd.github+json");

        // Unauthenticated requests share a small per-IP rate limit
        if let Some(token) = github_token() {
            request = request.header("Authorization", format!("token {}", token));
        }

        let response = request.send().await?;

        if response.status() == 404 {
            return Err(GitHubError::NotFound(self.releases_url.clone()));
        }
        if response.status() == 403 || response.status() == 429 {
            return Err(GitHubError::RateLimited);
        }
        let response = response.error_for_status()?;

        let releases: Vec<Release> = response
            .json()
            .await
            .map_err(|e| GitHubError::ParseError(e.to_string()))?;

        Ok(releases)
    }

    /// The most recently published release
    pub async fn latest_release(&self) -> Result<Release, GitHubError> {
        let releases = self.releases().await?;
        releases
            .into_iter()
            .filter(|release| release.published_at.is_some())
            .max_by_key(|release| release.published_at)
            .ok_or(GitHubError::NoReleases)
    }
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The `GITHUB_TOKEN` environment variable, if set and non-empty
pub fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
}
