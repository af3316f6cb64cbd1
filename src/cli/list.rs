use clap::Args;

use crate::models::table::{SimulationRow, SimulationsTable};
use crate::services::catalog::{CatalogClient, LoadOptions};
use crate::utils::error::Result;

/// List simulations, optionally restricted to named subsets
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Binary black-hole systems only
    #[arg(long, conflicts_with_all = ["bhns", "nsns"])]
    pub bbh: bool,

    /// Black hole-neutron star systems only
    #[arg(long, conflicts_with = "nsns")]
    pub bhns: bool,

    /// Binary neutron-star systems only
    #[arg(long)]
    pub nsns: bool,

    /// Eccentric systems only (eccentricity bound at least 1e-3)
    #[arg(long, conflicts_with = "noneccentric")]
    pub eccentric: bool,

    /// Non-eccentric systems only
    #[arg(long)]
    pub noneccentric: bool,

    /// Precessing systems only
    #[arg(long, conflicts_with = "nonprecessing")]
    pub precessing: bool,

    /// Non-precessing systems only
    #[arg(long)]
    pub nonprecessing: bool,

    /// Hyperbolic encounters only
    #[arg(long)]
    pub hyperbolic: bool,

    /// BBH systems carried through inspiral, merger, and ringdown
    #[arg(long)]
    pub imr: bool,

    /// Keep deprecated simulations in the listing
    #[arg(long)]
    pub include_deprecated: bool,

    /// Overlay the local catalog of scanned simulations
    #[arg(long)]
    pub local: bool,

    /// Release tag to list (default: the latest published release)
    #[arg(long, conflicts_with = "local")]
    pub tag: Option<String>,

    /// Use only the local cache; never touch the network
    #[arg(long)]
    pub offline: bool,

    /// Show at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output JSON rows instead of text columns
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    /// Execute the list command
    pub async fn run(&self) -> Result<()> {
        let mut client = CatalogClient::new()?;
        let simulations = client.load(&self.load_options()).await?;
        let table = self.apply_filters(&simulations.to_table());

        let shown = self.limit.unwrap_or(table.len()).min(table.len());
        let rows: Vec<&SimulationRow> = table.iter().take(shown).collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            print!("{}", render_rows(&rows));
            let tag = table.tag.as_deref().unwrap_or("unknown");
            if shown < table.len() {
                println!("\nShowing {} of {} simulations (tag {})", shown, table.len(), tag);
            } else {
                println!("\n{} simulations (tag {})", table.len(), tag);
            }
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

    fn apply_filters(&self, table: &SimulationsTable) -> SimulationsTable {
        let mut table = table.clone();
        if self.bbh {
            table = table.bbh();
        }
        if self.bhns {
            table = table.bhns();
        }
        if self.nsns {
            table = table.nsns();
        }
        if self.eccentric {
            table = table.eccentric();
        }
        if self.noneccentric {
            table = table.noneccentric();
        }
        if self.precessing {
            table = table.precessing();
        }
        if self.nonprecessing {
            table = table.nonprecessing();
        }
        if self.hyperbolic {
            table = table.hyperbolic();
        }
        if self.imr {
            table = table.imr();
        }
        if !self.include_deprecated {
            table = table.undeprecated();
        }
        table
    }
}

/// Fixed-width text columns for the most commonly compared quantities
fn render_rows(rows: &[&SimulationRow]) -> String {
    let mut output = format!(
        "{:<24} {:>8} {:>8} {:>10} {:>8}\n",
        "id", "q", "chi_eff", "e", "orbits"
    );
    for row in rows {
        output.push_str(&format!(
            "{:<24} {:>8} {:>8} {:>10} {:>8}\n",
            row.id,
            format_column(row.reference_mass_ratio, 3),
            format_column(row.reference_chi_eff, 3),
            format_column(row.reference_eccentricity_bound, 5),
            format_column(row.number_of_orbits, 1),
        ));
    }
    output
}

/// A fixed-precision cell; missing (NaN) values print as "-"
fn format_column(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.*}", precision, value)
    }
}
