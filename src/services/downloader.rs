// Streaming file downloads with freshness checks and atomic staging

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use reqwest::Client;

use crate::services::github::github_token;

/// Pointer files may chain, but not forever
const MAX_POINTER_DEPTH: usize = 5;

/// Downloader errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Filesystem failure while staging or renaming
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed or returned an error status
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The URL has no path component to derive a file name from
    #[error("Cannot derive a file name from URL '{0}'")]
    InvalidUrl(String),

    /// A chain of single-line URL pointer files never reached a real file
    #[error("Too many redirect pointer files starting from '{0}'")]
    PointerDepthExceeded(String),
}

/// Freshness policy for [`Downloader::download_file`]
#[derive(Debug, Clone, Default)]
pub enum IfNewer {
    /// Download unconditionally
    Always,
    /// Skip when the destination's mtime is newer than the server's
    /// `Last-Modified`
    #[default]
    LocalMtime,
    /// Skip when this instant is newer than the server's `Last-Modified`
    Since(DateTime<Utc>),
    /// Compare against this file's mtime and return it when it is fresh
    ReferencePath(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Render a console progress line while streaming
    pub progress: bool,
    pub if_newer: IfNewer,
}

/// Byte-level progress for one streaming download
#[derive(Debug)]
pub struct DownloadProgress {
    /// Bytes received so far
    pub downloaded_bytes: u64,
    /// Total bytes expected, from `Content-Length` when present
    pub total_bytes: Option<u64>,
    /// Download start time
    pub start_time: Instant,
    /// Current download speed in bytes/sec
    pub speed_bps: u64,
    /// Estimated time remaining in seconds
    pub eta_seconds: Option<u64>,
}

impl DownloadProgress {
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            downloaded_bytes: 0,
            total_bytes,
            start_time: Instant::now(),
            speed_bps: 0,
            eta_seconds: None,
        }
    }

    pub fn update(&mut self, downloaded_bytes: u64) {
        self.downloaded_bytes = downloaded_bytes;

        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.speed_bps = (downloaded_bytes as f64 / elapsed) as u64;

            if let Some(total) = self.total_bytes {
                if self.speed_bps > 0 {
                    let remaining_bytes = total.saturating_sub(downloaded_bytes);
                    self.eta_seconds = Some(remaining_bytes / self.speed_bps);
                }
            }
        }
    }

    pub fn progress_percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total > 0 {
                (self.downloaded_bytes as f64 / total as f64) * 100.0
            } else {
                0.0
            }
        })
    }

    pub fn is_complete(&self) -> bool {
        self.total_bytes
            .map_or(false, |total| self.downloaded_bytes >= total)
    }

    /// Rewrite the current console line with progress, speed, and ETA
    pub fn render(&self) {
        let mut line = match self.progress_percentage() {
            Some(percentage) => format!(
                "\r{:3.0}% [{} / {}]",
                percentage,
                format_bytes(self.downloaded_bytes),
                format_bytes(self.total_bytes.unwrap_or(0)),
            ),
            None => format!("\r[{}]", format_bytes(self.downloaded_bytes)),
        };
        line.push_str(&format!(" {}/s", format_bytes(self.speed_bps)));
        if let Some(eta) = self.eta_seconds {
            line.push_str(&format!(" ETA {}s", eta));
        }
        eprint!("{}", line);
    }

    /// Terminate the progress line
    pub fn finish(&self) {
        eprintln!();
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

enum Downloaded {
    File(PathBuf),
    Pointer(String),
}

/// HTTP file downloader
///
/// Streams into a `<name>.part` staging file that is atomically renamed
/// into place on success, so an interrupted download never clobbers an
/// existing file.
#[derive(Debug, Clone)]
pub struct Downloader {
    /// HTTP client for file requests
    client: Client,
    /// User agent string for requests
    user_agent: String,
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            user_agent: format!("sxscatalog/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Download `url` into `path`, returning the file actually written
    ///
    /// If `path` is an existing directory, the URL's path component is
    /// appended (creating subdirectories as needed). Parent directories are
    /// created. Redirects are followed, including SXS-style pointer files:
    /// a downloaded body consisting of a single `http(s)` URL line restarts
    /// the download against that URL.
    pub async fn download_file(
        &self,
        url: &str,
        path: &Path,
        options: &DownloadOptions,
    ) -> Result<PathBuf, DownloadError> {
        let mut url = url.to_string();
        for _ in 0..MAX_POINTER_DEPTH {
            match self.download_once(&url, path, options).await? {
                Downloaded::File(file) => return Ok(file),
                Downloaded::Pointer(next_url) => url = next_url,
            }
        }
        Err(DownloadError::PointerDepthExceeded(url))
    }

    async fn download_once(
        &self,
        url: &str,
        path: &Path,
        options: &DownloadOptions,
    ) -> Result<Downloaded, DownloadError> {
        let destination = resolve_destination(url, path)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut request = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent);

        // GitHub hosts share a small unauthenticated rate limit
        if url.starts_with("https://api.github.com/")
            || url.starts_with("https://raw.githubusercontent.com/")
        {
            if let Some(token) = github_token() {
                request = request.header("Authorization", format!("token {}", token));
            }
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            eprintln!("An error occurred when trying to access <{}>", url);
        }
        let response = response.error_for_status()?;

        if let Some(fresh) = self.fresh_local_file(&response, &destination, options) {
            return Ok(Downloaded::File(fresh));
        }

        let total_bytes = response.content_length();
        let part_path = destination.with_file_name(format!(
            "{}.part",
            destination
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| DownloadError::InvalidUrl(url.to_string()))?
        ));

        if let Err(error) = self
            .stream_to_file(response, &part_path, &destination, options.progress, total_bytes)
            .await
        {
            let _ = fs::remove_file(&part_path);
            return Err(error);
        }

        if let Some(next_url) = pointer_url(&part_path) {
            fs::remove_file(&part_path)?;
            return Ok(Downloaded::Pointer(next_url));
        }

        fs::rename(&part_path, &destination)?;
        Ok(Downloaded::File(destination))
    }

    /// When the freshness policy says the local file is newer than the
    /// server's `Last-Modified`, the path to return instead of downloading
    fn fresh_local_file(
        &self,
        response: &reqwest::Response,
        destination: &Path,
        options: &DownloadOptions,
    ) -> Option<PathBuf> {
        let remote = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(|text| DateTime::parse_from_rfc2822(text).ok())
            .map(|datetime| datetime.with_timezone(&Utc))?;

        let local = match &options.if_newer {
            IfNewer::Always => return None,
            IfNewer::Since(datetime) => Some(*datetime),
            IfNewer::ReferencePath(reference) if reference.exists() => mtime(reference),
            IfNewer::ReferencePath(_) | IfNewer::LocalMtime => mtime(destination),
        }?;

        if local > remote {
            if options.progress {
                eprintln!(
                    "Skipping download from '{}' because the local file is newer",
                    response.url()
                );
            }
            if let IfNewer::ReferencePath(reference) = &options.if_newer {
                if reference.exists() {
                    return Some(reference.clone());
                }
            }
            return Some(destination.to_path_buf());
        }
        None
    }

    async fn stream_to_file(
        &self,
        response: reqwest::Response,
        part_path: &Path,
        destination: &Path,
        progress: bool,
        total_bytes: Option<u64>,
    ) -> Result<(), DownloadError> {
        let mut tracker = if progress && total_bytes.is_some_and(|total| total > 0) {
            eprintln!("Downloading to {}:", destination.display());
            Some(DownloadProgress::new(total_bytes))
        } else {
            None
        };

        let mut file = fs::File::create(part_path)?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            if let Some(tracker) = tracker.as_mut() {
                tracker.update(downloaded);
                tracker.render();
            }
        }
        file.flush()?;
        if let Some(tracker) = &tracker {
            tracker.finish();
        }
        Ok(())
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the file to write: an existing directory target takes the URL's
/// path component as a relative file name
fn resolve_destination(url: &str, path: &Path) -> Result<PathBuf, DownloadError> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }
    let parsed =
        reqwest::Url::parse(url).map_err(|_| DownloadError::InvalidUrl(url.to_string()))?;
    let relative = parsed.path().trim_start_matches('/');
    if relative.is_empty() {
        return Err(DownloadError::InvalidUrl(url.to_string()));
    }
    Ok(path.join(relative))
}

/// A downloaded body that is exactly one line holding an http(s) URL is a
/// pointer to the real file
fn pointer_url(path: &Path) -> Option<String> {
    let content = fs::read(path).ok()?;
    let text = std::str::from_utf8(&content).ok()?;
    if !text.starts_with("http") {
        return None;
    }
    let mut lines = text.lines();
    let first = lines.next()?.trim();
    if lines.next().is_some() {
        return None;
    }
    let url = reqwest::Url::parse(first).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host()?;
    Some(first.to_string())
}

fn mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
