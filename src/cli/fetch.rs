use clap::Args;
use serde::{Deserialize, Serialize};

use crate::services::catalog::{CatalogClient, LoadOptions};
use crate::utils::error::Result;

/// Download a catalog release into the local cache
#[derive(Debug, Args)]
pub struct FetchCommand {
    /// Release tag to load (default: the latest published release)
    #[arg(long)]
    pub tag: Option<String>,

    /// Use only the local cache; never touch the network
    #[arg(long)]
    pub offline: bool,

    /// Reload even when a catalog is already memoized for this process
    #[arg(long)]
    pub refresh: bool,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

/// JSON response format for the fetch command
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: String,
    pub tag: Option<String>,
    pub published_at: Option<String>,
    pub simulations: usize,
    pub cache_path: Option<String>,
}

impl FetchCommand {
    /// Execute the fetch command
    pub async fn run(&self) -> Result<()> {
        let mut client = CatalogClient::new()?;
        let simulations = client.load(&self.load_options()).await?;

        if self.json {
            let response = FetchResponse {
                status: "success".to_string(),
                tag: simulations.tag.clone(),
                published_at: simulations.published_at.clone(),
                simulations: simulations.len(),
                cache_path: simulations
                    .source_path
                    .as_ref()
                    .map(|path| path.display().to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            println!(
                "Loaded catalog {} with {} simulations",
                simulations.tag.as_deref().unwrap_or("(unknown tag)"),
                simulations.len()
            );
            if let Some(path) = &simulations.source_path {
                println!("Cached at {}", path.display());
            }
        }

        Ok(())
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            download: if self.offline { Some(false) } else { None },
            tag: self.tag.clone(),
            show_progress: !self.quiet,
            ignore_cached: self.refresh,
            ..LoadOptions::default()
        }
    }
}
