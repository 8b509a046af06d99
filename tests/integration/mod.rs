//! Integration test suite for suitekit
//!
//! End-to-end tests over the public API and the `suitekit` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **config_pipeline**: profile loading, merging, overrides, substitution
//! - **tool_store**: tool scripts composed from configuration
//! - **data_store**: static data retrieval scripts
//! - **cli**: the `render`, `tools` and `data` commands

mod cli;
mod config_pipeline;
mod data_store;
mod tool_store;
