// sxscatalog - tools for the SXS catalog of numerical-relativity simulations
// Main CLI entry point

use clap::Parser;
use std::process;
use sxscatalog::cli::{Cli, CliDispatcher};
use sxscatalog::utils::error::UserError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = CliDispatcher::execute(cli.command).await;

    if let Err(err) = result {
        let user_error = UserError::from_sxs_error(&err);
        user_error.print();
        process::exit(user_error.exit_code);
    }
}
