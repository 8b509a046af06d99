//! Placeholder formatting for configuration strings.
//!
//! A configuration string may reference previously resolved values with
//! `{name}` tokens. Shell parameter expansions such as `${ENV_NAME:-}` share
//! the brace syntax but belong to the generated scripts, so they are copied
//! through untouched, braces and dollar sign included.
//!
//! | Input               | Meaning                         |
//! |---------------------|---------------------------------|
//! | `{name}`            | placeholder, replaced           |
//! | `{{` / `}}`         | literal `{` / `}`               |
//! | `${NAME:-default}`  | shell expansion, kept verbatim  |
//! | `{}`, `{a`, `a}`    | malformed template              |

use serde_yaml::Value;

use crate::core::{Result, SuiteError};

/// One lexical piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text copied to the output as-is (escapes already folded)
    Literal(String),
    /// A `{name}` placeholder
    Placeholder(&'a str),
}

/// Split a template into literal text and placeholders.
pub fn tokenize(template: &str) -> Result<Vec<Token<'_>>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                let end = shell_expansion_end(bytes, i + 1);
                literal.push_str(&template[i..end]);
                i = end;
            }
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                literal.push('{');
                i += 2;
            }
            b'{' => {
                let start = i + 1;
                let close = template[start..]
                    .find(['{', '}'])
                    .map(|offset| start + offset)
                    .filter(|&pos| bytes[pos] == b'}')
                    .ok_or_else(|| malformed(template, "unclosed '{' in placeholder"))?;
                let name = &template[start..close];
                if name.is_empty() {
                    return Err(malformed(template, "empty placeholder '{}'"));
                }
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Placeholder(name));
                i = close + 1;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                literal.push('}');
                i += 2;
            }
            b'}' => return Err(malformed(template, "single '}' encountered")),
            _ => {
                let next = template[i..]
                    .find(['$', '{', '}'])
                    .map_or(bytes.len(), |offset| if offset == 0 { i + 1 } else { i + offset });
                literal.push_str(&template[i..next]);
                i = next;
            }
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Index just past the `}` closing a `${...}` expansion whose `{` is at `open`.
///
/// Nested braces are balanced; an unterminated expansion runs to the end of
/// the template and is left for the shell to reject.
fn shell_expansion_end(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    for (offset, byte) in bytes[open..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return open + offset + 1;
                }
            }
            _ => {}
        }
    }
    bytes.len()
}

fn malformed(template: &str, reason: &str) -> SuiteError {
    SuiteError::MalformedTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

/// Names referenced by `{name}` placeholders, in order of appearance.
pub fn placeholder_names(template: &str) -> Result<Vec<&str>> {
    Ok(tokenize(template)?
        .into_iter()
        .filter_map(|token| match token {
            Token::Placeholder(name) => Some(name),
            Token::Literal(_) => None,
        })
        .collect())
}

/// Substitute every `{name}` in `template` using `lookup`.
///
/// Fails with [`SuiteError::MissingPlaceholder`] on the first name `lookup`
/// does not know. Values are rendered with [`stringify`].
pub fn format_with<'v, F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<&'v Value>,
{
    let mut out = String::with_capacity(template.len());
    for token in tokenize(template)? {
        match token {
            Token::Literal(text) => out.push_str(&text),
            Token::Placeholder(name) => {
                let value = lookup(name).ok_or_else(|| SuiteError::MissingPlaceholder {
                    name: name.to_string(),
                })?;
                out.push_str(&stringify(value));
            }
        }
    }
    Ok(out)
}

/// Render a tree value as text, the way it appears when substituted.
///
/// Strings are used verbatim; sequences and mappings use their bracketed
/// literal form (`['foo', 'boo']`), with nested strings single-quoted.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => repr(other, false),
    }
}

fn repr(value: &Value, quote_strings: bool) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if quote_strings => format!("'{s}'"),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(|item| repr(item, true)).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Mapping(map) => {
            let entries: Vec<String> =
                map.iter().map(|(k, v)| format!("{}: {}", repr(k, true), repr(v, true))).collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Tagged(tagged) => repr(&tagged.value, quote_strings),
    }
}
