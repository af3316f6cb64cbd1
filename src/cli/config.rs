use clap::Subcommand;
use serde_json::Value;

use crate::utils::config::{config_path, read_config, read_config_map, write_config};
use crate::utils::error::{Result, SxsError};

/// Configuration file commands
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the configuration file path
    Path,
    /// Print one configuration value
    Get {
        /// Configuration key, e.g. download_progress
        key: String,
    },
    /// Set a configuration key
    Set {
        /// Configuration key, e.g. download_progress
        key: String,
        /// Value; parsed as JSON when possible, kept as a string otherwise
        value: String,
    },
    /// Print all configuration keys and values (default)
    List,
}

/// Main config command handler
pub struct ConfigHandler {
    pub command: Option<ConfigCommands>,
}

impl ConfigHandler {
    /// Execute the config command
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Some(ConfigCommands::Path) => {
                println!("{}", config_path()?.display());
                Ok(())
            }
            Some(ConfigCommands::Get { key }) => match read_config(key) {
                Some(value) => {
                    println!("{}", value);
                    Ok(())
                }
                None => Err(SxsError::NotFound(format!("configuration key '{key}'"))),
            },
            Some(ConfigCommands::Set { key, value }) => {
                let path = write_config(key, parse_config_value(value))?;
                println!("Updated {}", path.display());
                Ok(())
            }
            Some(ConfigCommands::List) | None => {
                for (key, value) in read_config_map() {
                    println!("{} = {}", key, value);
                }
                Ok(())
            }
        }
    }
}

/// Parse a value as JSON when possible, falling back to a plain string, so
/// `set download_progress false` stores a boolean rather than `"false"`
fn parse_config_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
