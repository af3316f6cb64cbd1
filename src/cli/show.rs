use clap::Args;

use crate::models::identifier::SxsReference;
use crate::services::catalog::{CatalogClient, LoadOptions};
use crate::utils::error::{Result, SxsError};

/// Show one simulation's metadata
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// SXS ID of the simulation, e.g. SXS:BBH:0123
    pub id: String,

    /// Overlay the local catalog before looking up the ID
    #[arg(long)]
    pub local: bool,

    /// Release tag to load (default: the latest published release)
    #[arg(long, conflicts_with = "local")]
    pub tag: Option<String>,

    /// Use only the local cache; never touch the network
    #[arg(long)]
    pub offline: bool,

    /// Output pretty JSON instead of key = value text
    #[arg(long)]
    pub json: bool,
}

impl ShowCommand {
    /// Execute the show command
    pub async fn run(&self) -> Result<()> {
        // Reject malformed IDs before any catalog access; version and Lev
        // suffixes are tolerated and stripped
        let key = match self.id.parse::<SxsReference>() {
            Ok(reference) => reference.id.to_string(),
            // Local catalogs key unpublished runs by directory path
            Err(_) if self.local => self.id.clone(),
            Err(error) => return Err(SxsError::Validation(error)),
        };

        let mut client = CatalogClient::new()?;
        let simulations = client.load(&self.load_options()).await?;
        let metadata = simulations
            .get(&key)
            .ok_or_else(|| SxsError::NotFound(format!("simulation '{key}'")))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(metadata.as_map())?);
        } else {
            print!("{}", metadata);
        }

        Ok(())
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            download: if self.offline { Some(false) } else { None },
            tag: self.tag.clone(),
            local: self.local,
            ..LoadOptions::default()
        }
    }
}
