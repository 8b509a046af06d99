//! Static data retrieval.
//!
//! A data item describes how to bring a dataset into `{data_dir}/{name}`.
//! The `type` option selects the retrieval strategy:
//!
//! | Type     | Retrieval                                             |
//! |----------|-------------------------------------------------------|
//! | `copy`   | clean destination, `scp` the sources                  |
//! | `rsync`  | `rsync` the sources (default options `-avzpL`)        |
//! | `git`    | shallow clone of one branch                           |
//! | `link`   | symbolic link, checked to resolve to a directory      |
//! | `ecfs`   | clean destination, `ecp` from the archive             |
//! | `web`    | `wget` download checked against an md5 sum            |
//! | `custom` | nothing; pre/post scripts do the work                 |
//!
//! ```yaml
//! static_data:
//!   grids:
//!     type: git
//!     source: git@github.com:org/grids.git
//!     branch: main
//!     files: [o96.grib, n320.grib]
//!     post_script: "echo retrieved"
//! ```
//!
//! The generated script is laid out as an optional `# Pre-script` block, the
//! `# Main script for retrieving data` block and an optional `# Post-script`
//! block.

pub mod store;

pub use store::StaticDataStore;

use std::fmt;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::core::{Result, SuiteError};
use crate::models::{OneOrMany, basename, closest_match, from_options, join_path, type_tag};
use crate::scripts::{Script, templates};

/// Default `rsync` flags.
pub const DEFAULT_RSYNC_OPTIONS: &str = "-avzpL";

/// Retrieval strategy of a data item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Copy,
    Rsync,
    Git,
    Link,
    Ecfs,
    Custom,
    Web,
}

impl DataKind {
    /// All kinds, in the order their tags are suggested.
    pub const ALL: &'static [DataKind] = &[
        Self::Copy,
        Self::Rsync,
        Self::Git,
        Self::Link,
        Self::Ecfs,
        Self::Custom,
        Self::Web,
    ];

    /// Configuration tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Rsync => "rsync",
            Self::Git => "git",
            Self::Link => "link",
            Self::Ecfs => "ecfs",
            Self::Custom => "custom",
            Self::Web => "web",
        }
    }

    /// Kind for `tag`, or an unsupported-type error naming the item.
    pub fn parse(name: &str, tag: &str) -> Result<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == tag).ok_or_else(|| {
            let tags: Vec<&str> = Self::ALL.iter().map(|kind| kind.as_str()).collect();
            SuiteError::UnsupportedType {
                kind: "Static data".to_string(),
                name: name.to_string(),
                type_name: tag.to_string(),
                suggestion: closest_match(tag, &tags).map(str::to_string),
            }
        })
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DataOptions {
    source: Option<String>,
    files: Option<OneOrMany<String>>,
    branch: Option<String>,
    build_dir: Option<String>,
    rsync_options: Option<OneOrMany<String>>,
    url: Option<String>,
    md5: Option<String>,
    target: Option<String>,
}

impl DataOptions {
    fn require<'a>(name: &str, option: &str, value: &'a Option<String>) -> Result<&'a str> {
        value.as_deref().ok_or_else(|| SuiteError::MissingOption {
            name: name.to_string(),
            option: option.to_string(),
        })
    }

    fn source(&self, name: &str) -> Result<&str> {
        Self::require(name, "source", &self.source)
    }

    fn rsync_options(&self) -> String {
        match &self.rsync_options {
            Some(options) => options.clone().into_vec().join(" "),
            None => DEFAULT_RSYNC_OPTIONS.to_string(),
        }
    }

    fn files(&self) -> Option<Vec<String>> {
        self.files.clone().map(OneOrMany::into_vec)
    }

    /// Sources to transfer: each requested file under `source`, or `source` itself.
    fn targets(&self, name: &str) -> Result<Vec<String>> {
        let source = self.source(name)?;
        Ok(match self.files() {
            Some(files) => files.iter().map(|file| join_path(source, file)).collect(),
            None => vec![source.to_string()],
        })
    }
}

/// A static data item and its retrieval script.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    /// Item name
    pub name: String,
    /// Directory the item is retrieved under
    pub data_dir: String,
    /// Retrieval strategy
    pub kind: DataKind,
    /// Destination directory (`{data_dir}/{name}`, or under `build_dir`)
    pub path: String,
    /// Raw options, kept for the caller (execution context, labels)
    pub options: Value,
    /// Full retrieval script
    pub script: Script,
}

/// Build a data item from its options.
pub fn parse_data_item(data_dir: &str, name: &str, options: &Value) -> Result<DataItem> {
    let kind = DataKind::parse(name, type_tag(name, options)?)?;
    let opts: DataOptions = from_options(name, options)?;

    let root = opts.build_dir.as_deref().unwrap_or(data_dir);
    let dest = join_path(root, name);
    debug!("Building {kind} data item '{name}' into {dest}");

    let body = retrieval_body(kind, name, root, &dest, &opts)?;

    let pre = Script::from_source(options.get("pre_script"))?;
    let post = Script::from_source(options.get("post_script"))?;

    let mut script = Script::new();
    if !pre.is_empty() {
        script.push("# Pre-script");
        script.append(&pre);
        script.push("");
    }
    script.push("# Main script for retrieving data");
    script.push(format!("mkdir -p {root}"));
    script.append(&body);
    if !post.is_empty() {
        script.push("# Post-script");
        script.append(&post);
        script.push("");
    }

    Ok(DataItem {
        name: name.to_string(),
        data_dir: data_dir.to_string(),
        kind,
        path: dest,
        options: options.clone(),
        script,
    })
}

fn retrieval_body(kind: DataKind, name: &str, root: &str, dest: &str, opts: &DataOptions) -> Result<Script> {
    let mut body = Script::new();
    match kind {
        DataKind::Copy => body.push(templates::copy("scp", dest, &opts.targets(name)?)?),
        DataKind::Ecfs => body.push(templates::copy("ecp", dest, &opts.targets(name)?)?),
        DataKind::Rsync => {
            body.push(templates::rsync(dest, &opts.targets(name)?, &opts.rsync_options())?);
        }
        DataKind::Git => {
            let url = opts.source(name)?;
            let branch = DataOptions::require(name, "branch", &opts.branch)?;
            match opts.files() {
                None => body.push(templates::git_clone(dest, url, branch)?),
                Some(files) => {
                    let staging = join_path(&join_path(root, "git"), name);
                    let targets: Vec<String> = files.iter().map(|file| join_path(&staging, file)).collect();
                    body.push(templates::git_clone(&staging, url, branch)?);
                    body.push(templates::rsync(dest, &targets, &opts.rsync_options())?);
                    body.push("echo 'cleaning build directory'");
                    body.push(format!("rm -rf {staging}"));
                }
            }
        }
        DataKind::Link => body.push(templates::link(dest, opts.source(name)?)?),
        DataKind::Web => {
            let url = DataOptions::require(name, "url", &opts.url)?;
            let md5 = DataOptions::require(name, "md5", &opts.md5)?;
            let target = opts.target.clone().unwrap_or_else(|| basename(url).to_string());
            body.push(templates::web(dest, url, &target)?);
            body.push(templates::md5_check(md5, &target));
        }
        DataKind::Custom => body.push("# Running custom data command"),
    }
    Ok(body)
}
