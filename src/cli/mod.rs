//! Command-line interface for suitekit.
//!
//! # Commands
//!
//! - `render` - Print the resolved configuration of a profile
//! - `tools` - Compose load, unload and setup scripts of tools
//! - `data` - Print static data retrieval scripts
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Only report errors
//!
//! `RUST_LOG` takes precedence over both flags.
//!
//! # Examples
//!
//! ```bash
//! suitekit render -p profiles.yaml user -s host=hpc2
//! suitekit tools -p profiles.yaml user load mypackage
//! suitekit tools -p profiles.yaml user --format json setup mypackage
//! suitekit data -p profiles.yaml user --data-dir /scratch/data era5
//! ```

mod args;
mod data;
mod render;
mod tools;

pub use args::{OutputFormat, ProfileArgs};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Suitekit command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "suitekit",
    about = "Compose tool and data deployment scripts from layered suite configuration",
    version,
    long_about = "suitekit merges the configuration files of a profile, applies overrides, \
                  resolves {placeholders} and prints the shell scripts that load, unload and \
                  install tools or retrieve static data."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved configuration of a profile
    Render(render::RenderCommand),

    /// Compose tool scripts
    Tools(tools::ToolsCommand),

    /// Print static data retrieval scripts
    Data(data::DataCommand),
}

impl Cli {
    /// Set up logging and run the selected command.
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level());

        match self.command {
            Commands::Render(cmd) => cmd.execute(),
            Commands::Tools(cmd) => cmd.execute(),
            Commands::Data(cmd) => cmd.execute(),
        }
    }

    /// Default log filter for the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

/// Install the global subscriber, logging to stderr.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
