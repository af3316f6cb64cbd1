// Per-user sxs directories and the flat JSON configuration file

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::utils::error::{Result, SxsError};

/// Which per-user sxs directory to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Cache,
    Config,
}

impl DirectoryKind {
    fn env_var(self) -> &'static str {
        match self {
            DirectoryKind::Cache => "SXSCACHEDIR",
            DirectoryKind::Config => "SXSCONFIGDIR",
        }
    }

    fn platform_dir(self) -> Option<PathBuf> {
        match self {
            DirectoryKind::Cache => dirs::cache_dir(),
            DirectoryKind::Config => dirs::config_dir(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            DirectoryKind::Cache => "cache",
            DirectoryKind::Config => "config",
        }
    }
}

/// Resolve (and create) the sxs cache or config directory
///
/// Resolution order: the `SXSCACHEDIR`/`SXSCONFIGDIR` environment variable,
/// the platform cache/config directory plus `sxs`, then `~/.sxs`. When the
/// chosen directory cannot be created, a warning is printed to stderr and a
/// directory under the system temp dir is used for this session instead.
pub fn sxs_directory(kind: DirectoryKind) -> Result<PathBuf> {
    let env_override = env::var(kind.env_var()).ok().filter(|v| !v.is_empty());
    let preferred = match env_override {
        Some(dir) => PathBuf::from(dir),
        None => match kind.platform_dir() {
            Some(base) => base.join("sxs"),
            None => match dirs::home_dir() {
                Some(home) => home.join(".sxs"),
                None => PathBuf::from(".sxs"),
            },
        },
    };

    match fs::create_dir_all(&preferred) {
        Ok(()) => Ok(preferred),
        Err(err) => {
            let fallback = env::temp_dir().join(format!("sxs_{}", kind.label()));
            eprintln!(
                "Warning: could not create {} directory '{}' ({}); using '{}'",
                kind.label(),
                preferred.display(),
                err,
                fallback.display()
            );
            fs::create_dir_all(&fallback).map_err(|err| {
                SxsError::Config(format!(
                    "could not create {} directory '{}': {}",
                    kind.label(),
                    fallback.display(),
                    err
                ))
            })?;
            Ok(fallback)
        }
    }
}

/// Path of the configuration file (`<config dir>/config.json`)
pub fn config_path() -> Result<PathBuf> {
    Ok(sxs_directory(DirectoryKind::Config)?.join("config.json"))
}

/// Read the whole configuration map
///
/// A missing or corrupt file behaves as an empty configuration.
pub fn read_config_map() -> Map<String, Value> {
    let path = match config_path() {
        Ok(path) => path,
        Err(_) => return Map::new(),
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Map::new(),
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Read a single configuration key
pub fn read_config(key: &str) -> Option<Value> {
    read_config_map().remove(key)
}

/// Read a configuration key, deserializing into the default's type
pub fn read_config_or<T: DeserializeOwned>(key: &str, default: T) -> T {
    read_config(key)
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or(default)
}

/// Set a configuration key, merging with existing keys, and rewrite the
/// file as pretty-printed JSON
pub fn write_config(key: &str, value: Value) -> Result<PathBuf> {
    let path = config_path()?;
    let mut map = read_config_map();
    map.insert(key.to_string(), value);
    let content = serde_json::to_string_pretty(&Value::Object(map))?;
    fs::write(&path, content)?;
    Ok(path)
}
