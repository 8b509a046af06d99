//! Core types shared by every suitekit module.
//!
//! Currently this is the error system: [`SuiteError`] for typed failures,
//! [`ErrorContext`] and [`user_friendly_error`] for CLI reporting.

pub mod error;

pub use error::{ErrorContext, Result, SuiteError, user_friendly_error};
