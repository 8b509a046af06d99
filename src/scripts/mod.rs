//! Shell script fragments.
//!
//! Nothing here runs a script. A [`Script`] is an ordered list of text
//! fragments that tool and data definitions build up and that the caller
//! writes into task files. Multi-line blocks come from the `tera` templates
//! in [`templates`].

pub mod templates;

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;
use tera::{Context as TeraContext, Tera};
use tracing::trace;

use crate::config::stringify;
use crate::core::{Result, SuiteError};

/// An ordered list of script fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Script {
    fragments: Vec<String>,
}

impl Script {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script made of the given fragments.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// Append one fragment.
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Append all fragments of another script.
    pub fn append(&mut self, other: &Script) {
        self.fragments.extend(other.fragments.iter().cloned());
    }

    /// Builder form of [`Script::append`].
    pub fn then(mut self, other: &Script) -> Self {
        self.append(other);
        self
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Script text, fragments separated by newlines.
    pub fn render(&self) -> String {
        self.fragments.join("\n")
    }

    /// Script taken verbatim from a configuration value.
    ///
    /// A string is one fragment, a list gives one fragment per entry, null
    /// or an empty string is an empty script.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::new(),
            Some(Value::String(text)) if text.is_empty() => Self::new(),
            Some(Value::Sequence(items)) => Self::from_fragments(items.iter().map(stringify)),
            Some(other) => Self::from_fragments([stringify(other)]),
        }
    }

    /// Script from a pre/post script option.
    ///
    /// Like [`Script::from_value`], except that a string naming an existing
    /// file is replaced by the file content (without its final newline).
    pub fn from_source(value: Option<&Value>) -> Result<Self> {
        if let Some(Value::String(text)) = value {
            let path = Path::new(text);
            if !text.is_empty() && path.is_file() {
                trace!("Inlining script file {}", path.display());
                let content = std::fs::read_to_string(path).map_err(|source| {
                    SuiteError::ScriptFileRead {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                let content = content.strip_suffix('\n').unwrap_or(&content);
                return Ok(Self::from_fragments([content]));
            }
        }
        Ok(Self::from_value(value))
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Script {
    fn from(fragment: &str) -> Self {
        Self::from_fragments([fragment])
    }
}

impl From<String> for Script {
    fn from(fragment: String) -> Self {
        Self::from_fragments([fragment])
    }
}

impl From<Vec<String>> for Script {
    fn from(fragments: Vec<String>) -> Self {
        Self { fragments }
    }
}

/// Render a block template.
///
/// A fresh `Tera` instance per render; templates are never HTML-escaped.
pub fn render_template(name: &str, template: &str, context: &TeraContext) -> Result<String> {
    let mut tera = Tera::default();
    tera.autoescape_on(Vec::new());
    let rendered = tera.render_str(template, context).map_err(|e| SuiteError::ScriptTemplate {
        template: name.to_string(),
        reason: tera_error_chain(&e),
    })?;
    Ok(rendered.trim_end_matches('\n').to_string())
}

fn tera_error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Fragment reporting the deployed version through an ecflow label.
///
/// Reads `version.txt` from the current directory when a deployment step
/// wrote one.
pub fn update_label_version() -> String {
    update_label(
        "version",
        "$(if [[ -f version.txt ]]; then cat version.txt; else echo NA; fi)",
    )
}

/// Fragment setting an ecflow label.
pub fn update_label(label: &str, value: &str) -> String {
    format!("ecflow_client --label={label} {value}")
}
