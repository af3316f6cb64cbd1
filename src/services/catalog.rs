// Catalog loading: tag resolution, cache management, and the local overlay

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::models::metadata::Metadata;
use crate::models::simulations::Simulations;
use crate::services::annex::{AnnexScanner, ScanOptions, LOCAL_SIMULATIONS_FILE};
use crate::services::downloader::{DownloadOptions, Downloader, IfNewer};
use crate::services::github::GitHubClient;
use crate::utils::config::{read_config_or, sxs_directory, DirectoryKind};
use crate::utils::error::{Result, SxsError};
use crate::utils::version::{normalize_tag, CatalogVersion};

/// Raw-file host serving the published `simulations.json` for a release tag
const RAW_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/sxs-collaboration/sxscatalogdata/{tag}/simulations.json";

/// Options for [`CatalogClient::load`]
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Download policy: `None` tries the network and falls back to the
    /// cache with a warning; `Some(true)` must download; `Some(false)`
    /// uses the cache only
    pub download: Option<bool>,
    /// Release tag to load instead of the latest; mutually exclusive with
    /// `local` and `annex_dir`
    pub tag: Option<String>,
    /// Overlay the local catalog from the cache directory
    pub local: bool,
    /// Scan this annex directory (implies `local`), rewriting the local
    /// catalog before the overlay
    pub annex_dir: Option<PathBuf>,
    /// Where to write the local catalog when scanning an annex
    pub output_file: Option<PathBuf>,
    /// Record MD5 checksums while scanning an annex
    pub compute_md5: bool,
    /// Report progress on stderr; also gated by the `download_progress`
    /// configuration key
    pub show_progress: bool,
    /// Bypass and refresh the in-memory memo
    pub ignore_cached: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            download: None,
            tag: None,
            local: false,
            annex_dir: None,
            output_file: None,
            compute_md5: false,
            show_progress: true,
            ignore_cached: false,
        }
    }
}

/// Client for the catalog of SXS simulations
///
/// Owns the GitHub releases client, the file downloader, and the cache
/// layout. Unlike most SXS data files the simulations file changes
/// frequently, so [`CatalogClient::load`] checks for the latest release on
/// every call; the parsed catalog is memoized per client, and
/// [`CatalogClient::reload`] clears the memo.
#[derive(Debug)]
pub struct CatalogClient {
    /// Releases API client for tag resolution
    github: GitHubClient,
    /// Streaming file downloader
    downloader: Downloader,
    /// URL template for the raw simulations file, with a `{tag}` placeholder
    raw_url_template: String,
    /// Directory holding `simulations_<tag>.json.gz` cache files
    cache_dir: PathBuf,
    /// Catalog returned on repeated loads
    memo: Option<Simulations>,
}

impl CatalogClient {
    /// Create a client using the sxs cache directory
    pub fn new() -> Result<Self> {
        Ok(Self::with_cache_dir(sxs_directory(DirectoryKind::Cache)?))
    }

    /// Create a client with an explicit cache directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            github: GitHubClient::new(),
            downloader: Downloader::new(),
            raw_url_template: RAW_URL_TEMPLATE.to_string(),
            cache_dir,
            memo: None,
        }
    }

    /// Create a client with custom endpoints (for testing)
    pub fn with_endpoints(
        releases_url: String,
        raw_url_template: String,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            github: GitHubClient::with_releases_url(releases_url),
            downloader: Downloader::new(),
            raw_url_template,
            cache_dir,
            memo: None,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache file for a normalized release tag
    pub fn cache_path(&self, tag: &str) -> PathBuf {
        self.cache_dir.join(format!("simulations_{tag}.json.gz"))
    }

    /// Load the catalog of SXS simulations
    ///
    /// Resolves a release tag (explicit option, else the latest GitHub
    /// release, else the newest cached tag), ensures the corresponding
    /// cache file exists, and parses it. With `local` or `annex_dir` set,
    /// the local catalog is overlaid on the public one, preserving the
    /// published `DOI_versions` values.
    pub async fn load(&mut self, options: &LoadOptions) -> Result<Simulations> {
        if options.tag.is_some() && (options.local || options.annex_dir.is_some()) {
            return Err(SxsError::Validation(
                "cannot specify a tag together with local or annex_dir".to_string(),
            ));
        }

        if !options.ignore_cached {
            if let Some(memo) = &self.memo {
                return Ok(memo.clone());
            }
        }

        let simulations = if options.local || options.annex_dir.is_some() {
            self.load_local(options).await?
        } else {
            self.load_public(options).await?
        };

        if !options.ignore_cached {
            self.memo = Some(simulations.clone());
        }
        Ok(simulations)
    }

    /// Clear the memo and load again
    pub async fn reload(&mut self, options: &LoadOptions) -> Result<Simulations> {
        self.memo = None;
        self.load(options).await
    }

    /// Load the public catalog and overlay the local one
    async fn load_local(&self, options: &LoadOptions) -> Result<Simulations> {
        let (local, local_path) = match &options.annex_dir {
            Some(annex_dir) => {
                let scanner = AnnexScanner::new(annex_dir);
                let scan_options = ScanOptions {
                    compute_md5: options.compute_md5,
                    show_progress: options.show_progress,
                };
                let output = match &options.output_file {
                    Some(path) => path.clone(),
                    None => self.cache_dir.join(LOCAL_SIMULATIONS_FILE),
                };
                scanner.write_local_simulations(&scan_options, Some(&output))?
            }
            None => {
                let local_path = self.cache_dir.join(LOCAL_SIMULATIONS_FILE);
                if !local_path.exists() {
                    return Err(SxsError::NotFound(format!(
                        "local simulations file '{}'; scan an annex directory to create it",
                        local_path.display()
                    )));
                }
                let content = fs::read_to_string(&local_path)?;
                let local: BTreeMap<String, Metadata> = serde_json::from_str(&content)?;
                (local, local_path)
            }
        };

        let mut simulations = self.load_public(options).await?;
        simulations.merge_local(&local);
        simulations.source_path = Some(local_path);
        Ok(simulations)
    }

    async fn load_public(&self, options: &LoadOptions) -> Result<Simulations> {
        // Short-circuits so that quiet loads never touch the config file
        let progress = options.show_progress && read_config_or("download_progress", true);

        let (mut tag, mut published_at) = self.resolve_tag(options, progress).await?;

        let mut cache_path = self.cache_path(&tag);
        if !cache_path.exists() {
            if options.download == Some(false) {
                return Err(SxsError::NotFound(format!(
                    "simulations file '{}' (downloads are turned off)",
                    cache_path.display()
                )));
            }
            if let Err(error) = self.fetch_catalog(&tag, &cache_path, progress).await {
                // A tag chosen by the latest-release query may fall back to
                // the newest cached file when downloads are merely preferred
                let may_fall_back = options.download.is_none() && options.tag.is_none();
                match self.newest_cached_tag() {
                    Ok(cached_tag) if may_fall_back => {
                        eprintln!(
                            "Warning: failed to download the simulations file for tag {tag} \
                             ({error}); using cached tag {cached_tag}, which may be out of date"
                        );
                        tag = cached_tag;
                        published_at = None;
                        cache_path = self.cache_path(&tag);
                    }
                    _ => return Err(error),
                }
            }
        }

        let mut simulations = read_catalog_file(&cache_path)?;
        simulations.tag = Some(tag);
        simulations.published_at = published_at;
        simulations.source_path = Some(cache_path);
        Ok(simulations)
    }

    /// Resolve the release tag to load, normalized to `v<version>`
    async fn resolve_tag(
        &self,
        options: &LoadOptions,
        progress: bool,
    ) -> Result<(String, Option<String>)> {
        if let Some(tag) = &options.tag {
            let tag = normalize_tag(tag).map_err(SxsError::Validation)?;
            return Ok((tag, None));
        }

        if options.download == Some(false) {
            return Ok((self.newest_cached_tag()?, None));
        }

        match self.github.latest_release().await {
            Ok(release) => {
                let tag = normalize_tag(&release.tag_name).map_err(SxsError::Validation)?;
                let published_at = release.published_at.map(|time| time.to_rfc3339());
                if progress {
                    eprintln!(
                        "Loading SXS simulations using latest tag '{}', published at {}.",
                        tag,
                        published_at.as_deref().unwrap_or("an unknown time")
                    );
                }
                Ok((tag, published_at))
            }
            Err(error) => {
                if options.download == Some(true) {
                    return Err(error.into());
                }
                // `download: None` prefers the network but tolerates losing it
                let tag = self.newest_cached_tag().map_err(|_| SxsError::from(error))?;
                eprintln!(
                    "Warning: could not query the latest catalog release; using cached \
                     tag {tag}, which may be out of date"
                );
                Ok((tag, None))
            }
        }
    }

    /// The newest cached release tag by catalog-version order
    pub fn newest_cached_tag(&self) -> Result<String> {
        match cached_versions(&self.cache_dir).into_iter().max() {
            Some(version) => Ok(format!("v{version}")),
            None => Err(SxsError::NotFound(format!(
                "cached simulations files in '{}'",
                self.cache_dir.display()
            ))),
        }
    }

    /// Download `simulations.json` for `tag` and store it gzipped at
    /// `cache_path`
    ///
    /// The download lands in a temporary file that is compressed into a
    /// second temporary file, which is atomically renamed into place; the
    /// temporaries are removed on every path.
    async fn fetch_catalog(&self, tag: &str, cache_path: &Path, progress: bool) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        let url = self.raw_url_template.replace("{tag}", tag);
        let temp_json = self.cache_dir.join(format!("simulations_{tag}.temp.json"));

        let result = self
            .download_and_compress(&url, &temp_json, cache_path, progress)
            .await;
        let _ = fs::remove_file(&temp_json);
        result.map_err(|error| {
            SxsError::Download(format!("'{url}' (does tag {tag} exist?): {error}"))
        })
    }

    async fn download_and_compress(
        &self,
        url: &str,
        temp_json: &Path,
        cache_path: &Path,
        progress: bool,
    ) -> Result<()> {
        let download_options = DownloadOptions {
            progress,
            if_newer: IfNewer::Always,
        };
        let downloaded = self
            .downloader
            .download_file(url, temp_json, &download_options)
            .await?;

        let mut json_file = fs::File::open(&downloaded)?;
        let staged = tempfile::Builder::new()
            .prefix("simulations_")
            .suffix(".gz.tmp")
            .tempfile_in(&self.cache_dir)?;
        let mut encoder = GzEncoder::new(staged.as_file(), Compression::default());
        io::copy(&mut json_file, &mut encoder)?;
        encoder.finish()?;
        staged
            .persist(cache_path)
            .map_err(|error| SxsError::Io(error.error))?;
        Ok(())
    }
}

/// Read a gzipped `simulations.json` cache file
pub fn read_catalog_file(path: &Path) -> Result<Simulations> {
    let file = fs::File::open(path)?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder.read_to_string(&mut content).map_err(|error| {
        SxsError::Validation(format!(
            "failed to decompress '{}': {}",
            path.display(),
            error
        ))
    })?;
    Simulations::from_json_str(&content)
}

/// Catalog versions with a `simulations_<tag>.json.gz` file in `cache_dir`
///
/// Unreadable directories and file names that do not parse as catalog
/// versions simply contribute nothing.
fn cached_versions(cache_dir: &Path) -> Vec<CatalogVersion> {
    let mut versions = Vec::new();
    let entries = match fs::read_dir(cache_dir) {
        Ok(entries) => entries,
        Err(_) => return versions,
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(name) => name,
            None => continue,
        };
        let tag = name
            .strip_prefix("simulations_")
            .and_then(|rest| rest.strip_suffix(".json.gz"));
        if let Some(tag) = tag {
            if let Ok(version) = tag.parse::<CatalogVersion>() {
                versions.push(version);
            }
        }
    }
    versions
}
