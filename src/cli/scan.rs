use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::services::annex::{AnnexScanner, ScanOptions};
use crate::utils::error::Result;

/// Scan an annex directory into a local catalog file
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Annex directory to scan
    pub directory: PathBuf,

    /// Output file (default: local_simulations.json in the sxs cache)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Record an MD5 checksum for every publishable file
    #[arg(long)]
    pub md5: bool,

    /// Show a running progress count while scanning
    #[arg(long)]
    pub progress: bool,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

/// JSON response format for the scan command
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResponse {
    pub status: String,
    pub simulations: usize,
    pub output_path: String,
}

impl ScanCommand {
    /// Execute the scan command
    pub async fn run(&self) -> Result<()> {
        let scanner = AnnexScanner::new(&self.directory);
        let options = ScanOptions {
            compute_md5: self.md5,
            show_progress: self.progress,
        };
        let (simulations, output) =
            scanner.write_local_simulations(&options, self.output.as_deref())?;

        if self.json {
            let response = ScanResponse {
                status: "success".to_string(),
                simulations: simulations.len(),
                output_path: output.display().to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            println!(
                "Scanned {} simulations from {}",
                simulations.len(),
                self.directory.display()
            );
            println!("Wrote {}", output.display());
        }

        Ok(())
    }
}
