// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turbodial - outbound call dispatch and rep-matching engine.
//!
//! Binary entry point: loads and validates configuration, then runs the
//! selected subcommand.

use clap::{Parser, Subcommand};

mod serve;
mod status;

/// Turbodial - outbound call dispatch and rep-matching engine.
#[derive(Parser, Debug)]
#[command(name = "turbodial", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the dispatch engine and gateway.
    Serve,
    /// Show queue and rep-pool status for an org.
    Status {
        /// Org to report on.
        #[arg(long)]
        org_id: String,
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match turbodial_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            turbodial_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { org_id, json }) => status::run_status(&config, &org_id, json).await,
        None => {
            println!("turbodial: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("turbodial: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        super::Cli::command().debug_assert();
    }
}
