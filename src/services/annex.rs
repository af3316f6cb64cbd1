// Scanning a local annex of simulations into a catalog-style map

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::models::identifier::{lev_number, sxs_id};
use crate::models::metadata::Metadata;
use crate::utils::checksum::md5_file;
use crate::utils::config::{sxs_directory, DirectoryKind};
use crate::utils::error::{Result, SxsError};

/// File name of the local catalog inside the sxs cache directory
pub const LOCAL_SIMULATIONS_FILE: &str = "local_simulations.json";

/// Options for [`AnnexScanner::scan`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Record an MD5 checksum for every publishable file
    pub compute_md5: bool,
    /// Print a running count of processed simulations to stderr
    pub show_progress: bool,
}

/// Scanner for an annex: a directory tree holding unpublished simulations
///
/// A simulation is any directory with a `common-metadata.txt` file and at
/// least one `Lev<n>` subdirectory. The scanner walks the annex, skipping
/// hidden directories and never descending below a simulation, and builds
/// a metadata map in the same shape as the published catalog so the two
/// can be overlaid.
#[derive(Debug, Clone)]
pub struct AnnexScanner {
    annex_dir: PathBuf,
}

impl AnnexScanner {
    pub fn new(annex_dir: &Path) -> Self {
        Self {
            annex_dir: annex_dir.to_path_buf(),
        }
    }

    pub fn annex_dir(&self) -> &Path {
        &self.annex_dir
    }

    /// Walk the annex and build the map of simulations
    ///
    /// Each entry is keyed by the SXS ID found in `common-metadata.txt`, or
    /// by the directory path relative to the annex when no ID is recorded
    /// yet. The metadata comes from the highest `Lev` directory, extended
    /// with derived parameters, the level numbers, the relative directory,
    /// the latest file modification time, and a manifest of the files that
    /// would be uploaded on publication.
    ///
    /// A simulation that fails to process is reported on stderr and
    /// skipped; it never aborts the scan.
    pub fn scan(&self, options: &ScanOptions) -> Result<BTreeMap<String, Metadata>> {
        let annex_dir = self.annex_dir.canonicalize().map_err(|_| {
            SxsError::NotFound(format!("annex directory '{}'", self.annex_dir.display()))
        })?;

        let mut simulations = BTreeMap::new();
        let mut processed = 0;
        self.walk(&annex_dir, &annex_dir, &mut simulations, options, &mut processed);
        if options.show_progress && processed > 0 {
            eprintln!();
        }
        Ok(simulations)
    }

    /// Scan the annex and write the result as pretty-printed JSON
    ///
    /// With no explicit output file the catalog is written to
    /// `local_simulations.json` in the sxs cache directory, which is where
    /// the catalog client's local overlay looks for it.
    pub fn write_local_simulations(
        &self,
        options: &ScanOptions,
        output_file: Option<&Path>,
    ) -> Result<(BTreeMap<String, Metadata>, PathBuf)> {
        let simulations = self.scan(options)?;
        let output = match output_file {
            Some(path) => path.to_path_buf(),
            None => sxs_directory(DirectoryKind::Cache)?.join(LOCAL_SIMULATIONS_FILE),
        };
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&simulations)?;
        fs::write(&output, content)?;
        Ok((simulations, output))
    }

    fn walk(
        &self,
        dir: &Path,
        annex_dir: &Path,
        simulations: &mut BTreeMap<String, Metadata>,
        options: &ScanOptions,
        processed: &mut usize,
    ) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // Unreadable directories contribute nothing
            Err(_) => return,
        };

        // Hidden subdirectories and everything under them are ignored; the
        // annex root itself is walked whatever its name
        let mut subdirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && !is_hidden(&path) {
                subdirs.push(path);
            }
        }

        let is_simulation = dir.join("common-metadata.txt").is_file()
            && subdirs.iter().any(|subdir| lev_dir_number(subdir).is_some());

        if is_simulation {
            *processed += 1;
            if options.show_progress {
                eprint!("\rProcessing simulations: {processed}");
            }
            match self.process_simulation(dir, annex_dir, options) {
                Ok((key, metadata)) => {
                    simulations.insert(key, metadata);
                }
                Err(error) => {
                    if options.show_progress {
                        eprintln!();
                    }
                    eprintln!("Error processing {}: {}", dir.display(), error);
                }
            }
            // Never descend below a simulation directory
            return;
        }

        for subdir in subdirs {
            self.walk(&subdir, annex_dir, simulations, options, processed);
        }
    }

    /// Build the catalog entry for one simulation directory
    fn process_simulation(
        &self,
        dir: &Path,
        annex_dir: &Path,
        options: &ScanOptions,
    ) -> anyhow::Result<(String, Metadata)> {
        let key = extract_id_from_common_metadata(&dir.join("common-metadata.txt"), annex_dir)?;

        let levs = lev_directories(dir)?;
        let (_, highest) = levs
            .last()
            .ok_or_else(|| anyhow::anyhow!("no Lev directories in '{}'", dir.display()))?;

        let mut metadata = Metadata::load(&highest.join("metadata"))?;
        metadata.add_standard_parameters();

        let lev_numbers: Vec<i32> = levs.iter().map(|(number, _)| *number).collect();
        metadata.insert("lev_numbers", json!(lev_numbers));

        metadata.insert("directory", json!(relative_display(dir, annex_dir)));

        let files = files_to_upload(dir)?;
        metadata.insert("mtime", json!(latest_mtime(&files).to_rfc3339()));

        let mut manifest = Map::new();
        for file in &files {
            if !file.exists() {
                continue;
            }
            let relative = file.strip_prefix(dir).unwrap_or(file);
            let checksum = if options.compute_md5 {
                md5_file(file)?
            } else {
                String::new()
            };
            manifest.insert(
                path_to_invenio(relative),
                json!({
                    "link": file.display().to_string(),
                    "size": fs::metadata(file)?.len(),
                    "checksum": checksum,
                }),
            );
        }
        metadata.insert("files", Value::Object(manifest));

        Ok((key, metadata))
    }
}

/// The simulation's key: the SXS ID buried in the `alternative-names` line
/// of `common-metadata.txt`, or the directory path relative to the annex
/// when no ID is recorded yet
fn extract_id_from_common_metadata(file: &Path, annex_dir: &Path) -> anyhow::Result<String> {
    let content = fs::read_to_string(file)?;
    for line in content.lines() {
        if line.contains("alternative-names") {
            if let Some(id) = sxs_id(line) {
                return Ok(id.to_string());
            }
        }
    }
    let parent = file.parent().unwrap_or(file);
    Ok(relative_display(parent, annex_dir))
}

/// `path` relative to `base`, as text; `"."` for the base itself
fn relative_display(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    if relative.as_os_str().is_empty() {
        ".".to_string()
    } else {
        relative.display().to_string()
    }
}

/// A directory whose own name starts with a dot
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// The level number of a `Lev<n>` directory; `None` for anything else
fn lev_dir_number(path: &Path) -> Option<i32> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with("Lev") {
        lev_number(name)
    } else {
        None
    }
}

/// `Lev<n>` subdirectories in ascending numeric order
fn lev_directories(dir: &Path) -> std::io::Result<Vec<(i32, PathBuf)>> {
    let mut levs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(number) = lev_dir_number(&path) {
            levs.push((number, path));
        }
    }
    levs.sort_by_key(|(number, _)| *number);
    Ok(levs)
}

/// Publishable files across every `Lev` directory, sorted
/// case-insensitively by path
fn files_to_upload(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for (_, lev) in lev_directories(directory)? {
        let listing: Vec<PathBuf> = fs::read_dir(&lev)?
            .flatten()
            .map(|entry| entry.path())
            .collect();
        for file in &listing {
            if file_upload_allowed(file, &listing) {
                files.push(file.clone());
            }
        }
    }
    files.sort_by_key(|file| file.display().to_string().to_lowercase());
    Ok(files)
}

/// Whether a file belongs in the published-files manifest
///
/// `metadata.json` and `Horizons.h5` always qualify. `Strain_*` and
/// `ExtraWaveforms*` files qualify only when both the `.h5` and `.json`
/// forms are present, so half-written pairs stay unpublished.
fn file_upload_allowed(file: &Path, listing: &[PathBuf]) -> bool {
    let name = match file.file_name().and_then(|name| name.to_str()) {
        Some(name) => name,
        None => return false,
    };
    if name == "metadata.json" || name == "Horizons.h5" {
        return true;
    }
    if name.starts_with("Strain_") || name.starts_with("ExtraWaveforms") {
        return match file.extension().and_then(|ext| ext.to_str()) {
            Some("json") => listing.contains(&file.with_extension("h5")),
            Some("h5") => listing.contains(&file.with_extension("json")),
            _ => false,
        };
    }
    false
}

/// The latest modification time across `files`; the Unix epoch when there
/// are none
fn latest_mtime(files: &[PathBuf]) -> DateTime<Utc> {
    files
        .iter()
        .filter_map(|file| fs::metadata(file).ok()?.modified().ok())
        .map(DateTime::<Utc>::from)
        .max()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert a relative file path to the flat `:`-separated name used by the
/// publication backend
pub fn path_to_invenio(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join(":")
}

/// Convert a flat `:`-separated name back to a relative path
pub fn invenio_to_path(name: &str) -> PathBuf {
    name.split(':').collect()
}
