// Common error types for sxscatalog

use crate::services::downloader::DownloadError;
use crate::services::github::GitHubError;

/// Central error type for the library
#[derive(Debug, thiserror::Error)]
pub enum SxsError {
    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP-level failure (GitHub API or raw-file host)
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON parse or serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file or directory problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or option combination
    #[error("Validation error: {0}")]
    Validation(String),

    /// A catalog, simulation, or cache file that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// File download failure
    #[error("Download error: {0}")]
    Download(String),
}

impl From<reqwest::Error> for SxsError {
    fn from(err: reqwest::Error) -> Self {
        SxsError::Http(err.to_string())
    }
}

impl From<GitHubError> for SxsError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::NotFound(what) => SxsError::NotFound(what),
            other => SxsError::Http(other.to_string()),
        }
    }
}

impl From<DownloadError> for SxsError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Io(e) => SxsError::Io(e),
            other => SxsError::Download(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SxsError>;

/// Error presentation for the `sxscat` binary
pub struct UserError {
    pub message: String,
    pub exit_code: i32,
}

impl UserError {
    /// Map a library error to a user-facing message and exit code
    pub fn from_sxs_error(err: &SxsError) -> Self {
        let exit_code = match err {
            SxsError::NotFound(_) => 2,
            _ => 1,
        };
        Self {
            message: err.to_string(),
            exit_code,
        }
    }

    pub fn print(&self) {
        eprintln!("Error: {}", self.message);
    }
}
