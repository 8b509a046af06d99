//! suitekit - configuration composition and script synthesis for workflow suites
//!
//! A suite describes the software it runs on ("tools") and the data it needs
//! ("static data") as declarative YAML or TOML. suitekit turns those trees into
//! ordered, dependency-correct shell script fragments.
//!
//! # Architecture Overview
//!
//! - Configuration is assembled from several files selected by a profile,
//!   merged, overridden from the command line and resolved against itself.
//! - Each tool exposes `load`, `unload` and `setup` scripts plus a list of
//!   tools it depends on; the [`tools::ToolStore`] composes them in
//!   dependency order.
//! - Each static data item exposes a retrieval script, built by one of the
//!   strategies in [`data`].
//!
//! # Core Modules
//!
//! - [`config`] - Profiles, merging, overrides, `{placeholder}` substitution
//! - [`core`] - Error types and user-facing error reporting
//! - [`data`] - Static data retrieval strategies and their store
//! - [`tools`] - Tool strategies, dependency graph and script composition
//! - [`scripts`] - Script fragments and shell templates
//! - [`models`] - Option helpers shared by tools and data
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```yaml
//! # suite.yaml
//! lib_dir: "{HOME}/suite/lib"
//! environments:
//!   python3: {type: venv, extra_packages: [numpy]}
//! packages:
//!   mypackage:
//!     type: git
//!     source: git@github.com:org/mypackage.git
//!     branch: main
//!     depends: [python3]
//! ```
//!
//! ```rust,no_run
//! use suitekit::config::ConfigLoader;
//! use suitekit::tools::ToolStore;
//!
//! # fn example() -> suitekit::core::Result<()> {
//! let tree = ConfigLoader::new().load_files(&["suite.yaml"])?;
//! let lib_dir = tree["lib_dir"].as_str().unwrap_or("$LIB_DIR");
//! let store = ToolStore::new(lib_dir, &tree)?;
//! println!("{}", store.setup("mypackage")?);
//! println!("{}", store.load(&["mypackage"])?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod data;
pub mod models;
pub mod scripts;
pub mod tools;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
