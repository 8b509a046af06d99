//! `suitekit data`: print static data retrieval scripts.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use super::args::{OutputFormat, ProfileArgs, print_json};
use crate::data::StaticDataStore;

/// Print the retrieval script of a static data item.
#[derive(Args, Debug)]
pub struct DataCommand {
    #[command(flatten)]
    profile: ProfileArgs,

    /// Data directory, or a top-level key holding it (defaults to `data_dir`, then `$DATA_DIR`)
    #[arg(long = "data-dir", value_name = "DIR")]
    data_dir: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Data item to print; every item name is listed when omitted
    #[arg(value_name = "NAME")]
    name: Option<String>,
}

impl DataCommand {
    pub fn execute(self) -> Result<()> {
        let tree = self.profile.load()?;
        let data_dir = self
            .data_dir
            .as_deref()
            .or_else(|| tree.get("data_dir").map(|_| "data_dir"));
        let store = StaticDataStore::from_config(&tree, data_dir)
            .with_context(|| format!("Failed to build static data of profile '{}'", self.profile.profile))?;

        let Some(name) = &self.name else {
            let names: Vec<&str> = store.names().collect();
            return match self.format {
                OutputFormat::Json => print_json(&names),
                OutputFormat::Text => {
                    names.iter().for_each(|name| println!("{name}"));
                    Ok(())
                }
            };
        };

        let item = store.get(name)?;
        match self.format {
            OutputFormat::Json => print_json(&json!({
                "name": item.name,
                "type": item.kind.as_str(),
                "path": item.path,
                "script": item.script,
            })),
            OutputFormat::Text => {
                println!("{}", item.script);
                Ok(())
            }
        }
    }
}
