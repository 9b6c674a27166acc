//! # smelt CLI Entry Point
//!
//! Parses CLI arguments with clap and routes to the library operations.
//! Everything interesting lives in the library; this binary only resolves
//! `smelt.toml` into a [`BuildPlan`] and maps the build outcome to an exit
//! code.

use anyhow::Result;
use clap::{Parser, Subcommand};

use smelt::build;
use smelt::config::BuildPlan;

#[derive(Parser)]
#[command(name = "sm")]
#[command(about = "Incremental C/C++ build orchestrator", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile anything stale and link the output binary
    Build,
    /// Remove the intermediate and build output directories
    Clean,
    /// Clean, then build everything from scratch
    Rebuild,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build::load_config()?;
    let plan = BuildPlan::from_config(&config);

    let success = match cli.command {
        Commands::Build => build::build_project(&plan)?,
        Commands::Clean => {
            build::clean_project(&plan)?;
            true
        }
        Commands::Rebuild => build::rebuild_project(&plan)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
