//! Error handling for suitekit
//!
//! Two layers, as in most CLI tools built on `thiserror` + `anyhow`:
//! 1. [`SuiteError`] - one strongly-typed variant per failure mode, returned by
//!    every library operation through [`Result`].
//! 2. [`ErrorContext`] - a display wrapper adding details and an actionable
//!    suggestion, produced by [`user_friendly_error`] at the CLI boundary.
//!
//! # Error Categories
//!
//! - **Documents**: [`SuiteError::ConfigRead`], [`SuiteError::YamlError`],
//!   [`SuiteError::TomlError`], [`SuiteError::InvalidDocument`],
//!   [`SuiteError::DuplicateKeys`], [`SuiteError::ProfileNotFound`]
//! - **Substitution**: [`SuiteError::MissingPlaceholder`],
//!   [`SuiteError::MalformedTemplate`], [`SuiteError::UsedBeforeAssignment`],
//!   [`SuiteError::UndefinedVariable`], [`SuiteError::EnvironmentVariableUnset`]
//! - **Overrides**: [`SuiteError::InvalidOverride`],
//!   [`SuiteError::OverridePathNotFound`], [`SuiteError::OverrideCoercion`]
//! - **Dispatch**: [`SuiteError::UnsupportedType`],
//!   [`SuiteError::ConflictingOptions`], [`SuiteError::MissingOption`],
//!   [`SuiteError::InvalidOptions`]
//! - **Registry**: [`SuiteError::ToolNotFound`], [`SuiteError::DataNotFound`],
//!   [`SuiteError::CircularDependency`]
//! - **Scripts**: [`SuiteError::ScriptTemplate`], [`SuiteError::ScriptFileRead`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use suitekit::core::{SuiteError, user_friendly_error};
//!
//! let err = SuiteError::UsedBeforeAssignment {
//!     key: "myfile".to_string(),
//!     name: "path".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T, E = SuiteError> = std::result::Result<T, E>;

/// The main error type for suitekit operations.
///
/// Variants carry the names, keys and paths needed to point the user at the
/// offending configuration entry. Nothing is retried or recovered internally:
/// every variant reaches the immediate caller unchanged.
#[derive(Error, Debug)]
pub enum SuiteError {
    /// A configuration file could not be read.
    #[error("Failed to read configuration file: {}", .path.display())]
    ConfigRead {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A YAML document failed to parse.
    #[error("Invalid YAML in {file}: {reason}")]
    YamlError {
        /// Document label (usually the file path)
        file: String,
        /// Parser message
        reason: String,
    },

    /// A TOML document failed to parse.
    #[error("Invalid TOML in {file}: {reason}")]
    TomlError {
        /// Document label (usually the file path)
        file: String,
        /// Parser message
        reason: String,
    },

    /// A document does not have the expected shape (e.g. top level is not a mapping).
    #[error("Invalid configuration document {file}: {reason}")]
    InvalidDocument {
        /// Document label
        file: String,
        /// What is wrong with it
        reason: String,
    },

    /// Top-level keys defined by more than one document.
    ///
    /// Only the mergeable sections may be spread over several documents.
    #[error("Following keys found in {file} already exist in config: {}", .keys.join(", "))]
    DuplicateKeys {
        /// Document that introduced the duplicates
        file: String,
        /// The offending keys, in document order
        keys: Vec<String>,
    },

    /// Named profile missing from the profiles document.
    #[error("Configuration '{profile}' not found in {file}")]
    ProfileNotFound {
        /// Requested profile
        profile: String,
        /// Profiles document
        file: String,
    },

    /// A key required at the top level of the resolved configuration is absent.
    #[error("Configs must include a '{key}' entry")]
    MissingRequiredKey {
        /// The missing key
        key: String,
    },

    /// The formatter found a `{name}` token with no value in its mapping.
    #[error("Missing value for placeholder '{name}'")]
    MissingPlaceholder {
        /// Placeholder name
        name: String,
    },

    /// A template string has unbalanced or empty braces.
    #[error("Malformed template '{template}': {reason}")]
    MalformedTemplate {
        /// The offending template
        template: String,
        /// What is malformed
        reason: String,
    },

    /// A placeholder references a name that is only defined later in the tree.
    #[error("Variable substitution failed: Key \"{name}\" used before assignment (in '{key}')")]
    UsedBeforeAssignment {
        /// Key whose value holds the placeholder
        key: String,
        /// Referenced name
        name: String,
    },

    /// A placeholder references a name defined nowhere in the tree or globals.
    #[error("Variable substitution failed: Key \"{name}\" is not defined (in '{key}')")]
    UndefinedVariable {
        /// Key whose value holds the placeholder
        key: String,
        /// Referenced name
        name: String,
    },

    /// A placeholder names an environment-sourced global that is not set.
    #[error("Environment variable {name} is not set")]
    EnvironmentVariableUnset {
        /// Environment variable name
        name: String,
    },

    /// A `key.path=value` override is syntactically invalid or not applicable.
    #[error("Invalid override '{entry}': {reason}")]
    InvalidOverride {
        /// The raw override
        entry: String,
        /// Why it was rejected
        reason: String,
    },

    /// An override walks through a level that does not exist.
    #[error("Override path '{path}' not found: missing '{segment}'")]
    OverridePathNotFound {
        /// Full dotted path
        path: String,
        /// First missing segment
        segment: String,
    },

    /// An override value cannot be converted to the type of the existing leaf.
    #[error("Cannot convert '{value}' to {expected} for '{path}'")]
    OverrideCoercion {
        /// Full dotted path
        path: String,
        /// Raw value
        value: String,
        /// Name of the expected type
        expected: String,
    },

    /// An unrecognized variant tag for a tool or data item.
    #[error("{kind} type '{type_name}' not supported (in '{name}')")]
    UnsupportedType {
        /// What was being built ("Static data", "Environment")
        kind: String,
        /// Entity name
        name: String,
        /// The unrecognized tag
        type_name: String,
        /// Closest known tag, if any is similar enough
        suggestion: Option<String>,
    },

    /// Mutually exclusive options were given together.
    #[error("Conflicting options for '{name}': {reason}")]
    ConflictingOptions {
        /// Entity name
        name: String,
        /// Which options conflict
        reason: String,
    },

    /// A required option is missing.
    #[error("Missing option '{option}' for '{name}'")]
    MissingOption {
        /// Entity name
        name: String,
        /// Option key
        option: String,
    },

    /// Options have the wrong shape for the selected variant.
    #[error("Invalid options for '{name}': {reason}")]
    InvalidOptions {
        /// Entity name
        name: String,
        /// Deserializer message
        reason: String,
    },

    /// A tool name is not present in the store.
    #[error("Tool '{name}' not found")]
    ToolNotFound {
        /// Tool name
        name: String,
    },

    /// A static data item is not present in the store.
    #[error("Static data '{name}' not found")]
    DataNotFound {
        /// Data item name
        name: String,
    },

    /// Tool dependencies form a cycle.
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// Rendered cycle, e.g. `a → b → a`
        chain: String,
    },

    /// A script template failed to render.
    #[error("Script template '{template}' failed: {reason}")]
    ScriptTemplate {
        /// Template identifier
        template: String,
        /// Renderer message
        reason: String,
    },

    /// A pre/post script file exists but could not be read.
    #[error("Failed to read script file: {}", .path.display())]
    ScriptFileRead {
        /// Script path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Error wrapper with user-facing details and a suggestion.
///
/// Built by [`user_friendly_error`]; printed by the CLI with [`ErrorContext::display`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The headline message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with just a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Recognizes [`SuiteError`] anywhere in the `anyhow` chain; other errors are
/// reported with their full cause chain and no suggestion.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(suite_error) = error.chain().find_map(|e| e.downcast_ref::<SuiteError>()) {
        return create_error_context(suite_error);
    }

    let mut message = error.to_string();
    for cause in error.chain().skip(1) {
        message.push_str(&format!("\n  caused by: {cause}"));
    }
    ErrorContext::new(message)
}

fn create_error_context(error: &SuiteError) -> ErrorContext {
    let ctx = ErrorContext::new(error.to_string());
    match error {
        SuiteError::DuplicateKeys {
            ..
        } => ctx
            .with_details("Only mergeable sections may appear in more than one configuration file")
            .with_suggestion("Remove the duplicated keys from one of the files of the profile"),
        SuiteError::UsedBeforeAssignment {
            name,
            ..
        } => ctx
            .with_details("Values are resolved in document order; a key is only visible after it is defined")
            .with_suggestion(format!("Move the definition of '{name}' above its first use")),
        SuiteError::UndefinedVariable {
            name,
            ..
        } => ctx.with_suggestion(format!(
            "Define '{name}' in the configuration, pass it as a global, or escape the braces as '{{{{{name}}}}}'"
        )),
        SuiteError::EnvironmentVariableUnset {
            name,
        } => ctx
            .with_details("Environment-sourced globals are never substituted with an empty value")
            .with_suggestion(format!("Export {name} before rendering the configuration")),
        SuiteError::UnsupportedType {
            suggestion: Some(closest),
            ..
        } => ctx.with_suggestion(format!("Did you mean '{closest}'?")),
        SuiteError::ConflictingOptions {
            ..
        } => ctx.with_suggestion("Keep exactly one of the conflicting options"),
        SuiteError::OverridePathNotFound {
            ..
        }
        | SuiteError::InvalidOverride {
            ..
        } => ctx.with_suggestion(
            "Overrides use the form key.path=value and must target an existing section",
        ),
        SuiteError::CircularDependency {
            ..
        } => ctx.with_suggestion("Remove one of the 'depends' entries that close the cycle"),
        SuiteError::ToolNotFound {
            name,
        } => ctx.with_suggestion(format!(
            "Declare '{name}' under modules, packages, environments or env_variables"
        )),
        SuiteError::YamlError {
            ..
        }
        | SuiteError::TomlError {
            ..
        } => ctx.with_suggestion("Check the syntax of the configuration file"),
        _ => ctx,
    }
}
