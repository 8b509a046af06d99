//! `suitekit render`: print a resolved profile.

use anyhow::Result;
use clap::Args;
use tracing::debug;

use super::args::{OutputFormat, ProfileArgs, print_json};

/// Merge, override and substitute a profile, then print the result.
#[derive(Args, Debug)]
pub struct RenderCommand {
    #[command(flatten)]
    profile: ProfileArgs,

    /// Print only this top-level key
    #[arg(short = 'k', long = "key", value_name = "KEY")]
    key: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl RenderCommand {
    pub fn execute(self) -> Result<()> {
        let tree = self.profile.load()?;
        let value = match &self.key {
            Some(key) => tree
                .get(key.as_str())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Key '{key}' not found in profile '{}'", self.profile.profile))?,
            None => tree,
        };
        debug!("Rendering profile '{}'", self.profile.profile);

        match self.format {
            OutputFormat::Json => print_json(&value),
            OutputFormat::Text => {
                print!("{}", serde_yaml::to_string(&value)?);
                Ok(())
            }
        }
    }
}
