use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_DOC_FILE_NAME: &str = "readme.html";
const TRIPLE_QUOTE: &str = "\"\"\"";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub summary: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub doc_file_name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest is missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("manifest line {line}: {details}")]
    Syntax { line: usize, details: String },

    #[error("add-on name '{0}' cannot be used as a directory name")]
    InvalidName(String),
}

impl Manifest {
    /// Minimal manifest with the summary defaulting to the name.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            summary: name.clone(),
            name,
            version: version.into(),
            author: None,
            description: None,
            doc_file_name: DEFAULT_DOC_FILE_NAME.to_string(),
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Parse the top-level `key = value` block of a `manifest.ini`.
    ///
    /// # Errors
    /// Returns an error for malformed lines, an unterminated triple-quoted
    /// value, or a missing `name`/`version`.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let values = parse_values(text)?;
        let required = |key: &'static str| {
            values
                .get(key)
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or(ManifestError::MissingKey(key))
        };

        let name = required("name")?;
        if !is_safe_name(&name) {
            return Err(ManifestError::InvalidName(name));
        }
        let version = required("version")?;
        let optional = |key: &str| values.get(key).filter(|value| !value.is_empty()).cloned();

        Ok(Self {
            summary: optional("summary").unwrap_or_else(|| name.clone()),
            author: optional("author"),
            description: optional("description"),
            doc_file_name: optional("docFileName")
                .unwrap_or_else(|| DEFAULT_DOC_FILE_NAME.to_string()),
            name,
            version,
        })
    }
}

impl FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_values(text: &str) -> Result<HashMap<String, String>, ManifestError> {
    let mut values = HashMap::new();
    let mut lines = text.trim_start_matches('\u{feff}').lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            break;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ManifestError::Syntax {
                line: index + 1,
                details: format!("expected 'key = value', found '{line}'"),
            });
        };
        let value = value.trim();

        let value = if let Some(rest) = value.strip_prefix(TRIPLE_QUOTE) {
            if let Some(end) = rest.find(TRIPLE_QUOTE) {
                rest[..end].to_string()
            } else {
                let mut collected = vec![rest.to_string()];
                loop {
                    let Some((_, next)) = lines.next() else {
                        return Err(ManifestError::Syntax {
                            line: index + 1,
                            details: "unterminated triple-quoted value".to_string(),
                        });
                    };
                    if let Some(end) = next.find(TRIPLE_QUOTE) {
                        collected.push(next[..end].to_string());
                        break;
                    }
                    collected.push(next.to_string());
                }
                collected.join("\n").trim().to_string()
            }
        } else {
            unquote(value).to_string()
        };

        values.insert(key.trim().to_string(), value);
    }

    Ok(values)
}

/// Add-on names become directory names, so they must stay a single plain
/// path component.
fn is_safe_name(name: &str) -> bool {
    name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
        && !name.chars().any(char::is_control)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    // Unquoted values may carry a trailing comment.
    value.split(" #").next().unwrap_or(value).trim()
}
