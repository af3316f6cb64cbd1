// CLI module for the sxscat command-line interface

pub mod config;
pub mod fetch;
pub mod list;
pub mod scan;
pub mod show;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::error::Result;

use self::config::{ConfigCommands, ConfigHandler};
use self::fetch::FetchCommand;
use self::list::ListCommand;
use self::scan::ScanCommand;
use self::show::ShowCommand;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "sxscat")]
#[command(about = "A minimal set of tools for interacting with the SXS catalog of numerical-relativity simulations")]
#[command(long_about = r#"sxscat is a small interface to the SXS Collaboration's catalog of
numerical-relativity simulations.

Features:
  • Catalog downloads pinned to published release tags, with local caching
  • Named subset filters over the simulation table (BBH, eccentric, ...)
  • Per-simulation metadata as JSON or key = value text
  • Annex scanning to catalog unpublished local simulations
  • A flat JSON configuration file shared with the sxs tooling

Examples:
  sxscat fetch                     Download the latest catalog release
  sxscat list --bbh --limit 10     The first ten binary black-hole systems
  sxscat show SXS:BBH:0123         Metadata for one simulation
  sxscat scan /path/to/annex       Build the local catalog from an annex
  sxscat config set download_progress false

For detailed documentation, visit: https://github.com/sxs-collaboration/sxscatalog"#)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// All available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Download a catalog release into the local cache
    #[command(long_about = r#"Download a catalog release into the local cache.

Without --tag, the latest published release is looked up on GitHub; when
that lookup or the download fails, the newest already-cached release is
used instead (with a warning). The downloaded simulations file is stored
gzipped under the sxs cache directory, keyed by tag, so every release
fetched once stays available offline.

Examples:
  sxscat fetch                          Fetch the latest release
  sxscat fetch --tag v2.0.0             Fetch a specific release
  sxscat fetch --offline                Use the cache only; never download
  sxscat fetch --quiet --json           Machine-readable result, no progress"#)]
    Fetch {
        /// Release tag to load (default: the latest published release)
        #[arg(long)]
        tag: Option<String>,

        /// Use only the local cache; never touch the network
        #[arg(long)]
        offline: bool,

        /// Reload even when a catalog is already memoized for this process
        #[arg(long)]
        refresh: bool,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,

        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// List simulations, optionally restricted to named subsets
    #[command(long_about = r#"List simulations from the catalog as a table.

Filters combine by intersection, and deprecated simulations are hidden
unless --include-deprecated is given. The text output shows the ID, mass
ratio, effective spin, eccentricity (upper bounds such as "<0.0001"
convert to the bounding value), and orbit count; missing values print as
"-". With --json, the full set of table columns is emitted per row, with
missing numeric values as null.

Examples:
  sxscat list                           Every current simulation
  sxscat list --bbh --noneccentric      Circular binary black holes
  sxscat list --precessing --limit 5    First five precessing systems
  sxscat list --local                   Include locally scanned simulations
  sxscat list --tag v2.0.0 --json       Rows from an older release"#)]
    List {
        /// Binary black-hole systems only
        #[arg(long, conflicts_with_all = ["bhns", "nsns"])]
        bbh: bool,

        /// Black hole-neutron star systems only
        #[arg(long, conflicts_with = "nsns")]
        bhns: bool,

        /// Binary neutron-star systems only
        #[arg(long)]
        nsns: bool,

        /// Eccentric systems only (eccentricity bound at least 1e-3)
        #[arg(long, conflicts_with = "noneccentric")]
        eccentric: bool,

        /// Non-eccentric systems only
        #[arg(long)]
        noneccentric: bool,

        /// Precessing systems only
        #[arg(long, conflicts_with = "nonprecessing")]
        precessing: bool,

        /// Non-precessing systems only
        #[arg(long)]
        nonprecessing: bool,

        /// Hyperbolic encounters only
        #[arg(long)]
        hyperbolic: bool,

        /// BBH systems carried through inspiral, merger, and ringdown
        #[arg(long)]
        imr: bool,

        /// Keep deprecated simulations in the listing
        #[arg(long)]
        include_deprecated: bool,

        /// Overlay the local catalog of scanned simulations
        #[arg(long)]
        local: bool,

        /// Release tag to list (default: the latest published release)
        #[arg(long, conflicts_with = "local")]
        tag: Option<String>,

        /// Use only the local cache; never touch the network
        #[arg(long)]
        offline: bool,

        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,

        /// Output JSON rows instead of text columns
        #[arg(long)]
        json: bool,
    },

    /// Show one simulation's metadata
    #[command(long_about = r#"Show the metadata of a single simulation.

The ID may carry version and resolution suffixes (SXS:BBH:0123v2.0/Lev5);
the lookup uses the bare ID. With --local, keys of unpublished local
simulations (their directory paths) are accepted as well. Text output is
one "key = value" line per entry; --json prints the metadata object.

Examples:
  sxscat show SXS:BBH:0123              Key = value metadata lines
  sxscat show SXS:BBH:0123 --json       The raw metadata object
  sxscat show Incoming/q5 --local       An unpublished local simulation"#)]
    Show {
        /// SXS ID of the simulation, e.g. SXS:BBH:0123
        id: String,

        /// Overlay the local catalog before looking up the ID
        #[arg(long)]
        local: bool,

        /// Release tag to load (default: the latest published release)
        #[arg(long, conflicts_with = "local")]
        tag: Option<String>,

        /// Use only the local cache; never touch the network
        #[arg(long)]
        offline: bool,

        /// Output pretty JSON instead of key = value text
        #[arg(long)]
        json: bool,
    },

    /// Scan an annex directory into a local catalog file
    #[command(long_about = r#"Scan an annex of simulation directories into a local catalog file.

A simulation is a directory holding common-metadata.txt and at least one
Lev<n> subdirectory. Each one contributes the metadata of its highest
resolution level, extended with derived parameters, its level numbers,
and a manifest of the files that would be uploaded on publication. The
result is written as JSON; by default to local_simulations.json in the
sxs cache directory, where "list --local" and "show --local" find it.

Examples:
  sxscat scan /data/annex               Scan into the default location
  sxscat scan /data/annex --md5         Record file checksums (slow)
  sxscat scan /data/annex --output catalog.json --progress"#)]
    Scan {
        /// Annex directory to scan
        directory: PathBuf,

        /// Output file (default: local_simulations.json in the sxs cache)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Record an MD5 checksum for every publishable file
        #[arg(long)]
        md5: bool,

        /// Show a running progress count while scanning
        #[arg(long)]
        progress: bool,

        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Read and write the sxs configuration file
    #[command(long_about = r#"Read and write the flat JSON configuration file.

The file lives at config.json inside the sxs config directory (set
SXSCONFIGDIR to relocate it). Values given to "set" are parsed as JSON
when possible and stored as plain strings otherwise. Keys the tools
consult include "download_progress".

Subcommands:
  path      Print the configuration file path
  get       Print one value
  set       Set a key
  list      Print all keys and values (default action)

Examples:
  sxscat config                         List all configuration values
  sxscat config path                    Where the file lives
  sxscat config set download_progress false
  sxscat config get download_progress"#)]
    Config {
        /// Config subcommand
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// CLI command dispatcher
pub struct CliDispatcher;

impl CliDispatcher {
    /// Execute a CLI command
    pub async fn execute(command: Commands) -> Result<()> {
        match command {
            Commands::Fetch {
                tag,
                offline,
                refresh,
                quiet,
                json,
            } => {
                let cmd = FetchCommand {
                    tag,
                    offline,
                    refresh,
                    quiet,
                    json,
                };
                cmd.run().await
            }

            Commands::List {
                bbh,
                bhns,
                nsns,
                eccentric,
                noneccentric,
                precessing,
                nonprecessing,
                hyperbolic,
                imr,
                include_deprecated,
                local,
                tag,
                offline,
                limit,
                json,
            } => {
                let cmd = ListCommand {
                    bbh,
                    bhns,
                    nsns,
                    eccentric,
                    noneccentric,
                    precessing,
                    nonprecessing,
                    hyperbolic,
                    imr,
                    include_deprecated,
                    local,
                    tag,
                    offline,
                    limit,
                    json,
                };
                cmd.run().await
            }

            Commands::Show {
                id,
                local,
                tag,
                offline,
                json,
            } => {
                let cmd = ShowCommand {
                    id,
                    local,
                    tag,
                    offline,
                    json,
                };
                cmd.run().await
            }

            Commands::Scan {
                directory,
                output,
                md5,
                progress,
                json,
            } => {
                let cmd = ScanCommand {
                    directory,
                    output,
                    md5,
                    progress,
                    json,
                };
                cmd.run().await
            }

            Commands::Config { command } => {
                let handler = ConfigHandler { command };
                handler.execute().await
            }
        }
    }
}
