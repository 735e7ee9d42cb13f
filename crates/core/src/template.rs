//! Prompt templates with `{name}` placeholders.
//!
//! Escaping follows the `str.format` convention used by the prompt files in
//! circulation: `{{` and `}}` are literal braces, and any other brace must
//! belong to a placeholder. Substituted values are inserted verbatim and never
//! re-scanned, so a transcript full of JSON braces is safe.

use std::path::Path;

use crate::error::{Error, Result, TemplateError};

/// Placeholder filled with the rendered transcript.
pub const TRAJECTORY_VAR: &str = "trajectory";

/// Placeholder filled with the taxonomy document (empty when none).
pub const TAXONOMY_VAR: &str = "taxonomy";

/// A prompt template loaded from disk or built in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Read a template file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { source })
    }

    /// Substitute `vars` into the template.
    ///
    /// Every placeholder must name one of `vars`; unused vars are fine.
    pub fn render(&self, vars: &[(&str, &str)]) -> std::result::Result<String, TemplateError> {
        let src = self.source.as_str();
        let bytes = src.as_bytes();
        let mut out = String::with_capacity(src.len());
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    out.push_str(&src[literal_start..i]);
                    if bytes.get(i + 1) == Some(&b'{') {
                        out.push('{');
                        i += 2;
                    } else {
                        let rest = &src[i + 1..];
                        let end = rest
                            .find(['{', '}'])
                            .filter(|&end| rest.as_bytes()[end] == b'}')
                            .ok_or(TemplateError::UnclosedBrace(i))?;
                        out.push_str(lookup(&rest[..end], i, vars)?);
                        i += end + 2;
                    }
                    literal_start = i;
                }
                b'}' => {
                    if bytes.get(i + 1) != Some(&b'}') {
                        return Err(TemplateError::StrayClosingBrace(i));
                    }
                    out.push_str(&src[literal_start..i]);
                    out.push('}');
                    i += 2;
                    literal_start = i;
                }
                _ => i += 1,
            }
        }

        out.push_str(&src[literal_start..]);
        Ok(out)
    }
}

fn lookup<'v>(
    name: &str,
    offset: usize,
    vars: &[(&str, &'v str)],
) -> std::result::Result<&'v str, TemplateError> {
    if name.is_empty() {
        return Err(TemplateError::EmptyPlaceholder(offset));
    }
    if name.contains(['!', ':']) {
        return Err(TemplateError::UnsupportedSpec(name.to_string()));
    }
    vars.iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))
}
