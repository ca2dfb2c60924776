//! Reel CLI - inspect, convert and bake input movies
//!
//! # Commands
//!
//! - `reel info` - Print a movie's metadata and size
//! - `reel convert` - Rewrite a movie in the other profile
//! - `reel validate` - Check that movies and scripts load
//! - `reel run-script` - Play a script headlessly, optionally baking it to a movie
//!
//! # Usage
//!
//! ```bash
//! reel info speedrun.irb --json
//! reel convert speedrun.irb speedrun.irt
//! reel run-script combo.lua --frames 300 --output combo.irb
//! ```

mod convert;
mod info;
mod run;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Reel CLI - inspect, convert and bake input movies
#[derive(Parser)]
#[command(name = "reel")]
#[command(about = "Inspect, convert and bake input movies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a movie's metadata and size
    Info(info::InfoArgs),

    /// Rewrite a movie in another profile
    Convert(convert::ConvertArgs),

    /// Check that movies and scripts load
    Validate(validate::ValidateArgs),

    /// Play a script without an emulator
    RunScript(run::RunArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info(args) => info::execute(args),
        Commands::Convert(args) => convert::execute(args),
        Commands::Validate(args) => validate::execute(args),
        Commands::RunScript(args) => run::execute(args),
    }
}
