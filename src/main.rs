//! suitekit CLI entry point
//!
//! Parses the command line, runs the command and prints failures with
//! their context and suggestions.

use anyhow::Result;
use clap::Parser;
use suitekit::cli;
use suitekit::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
