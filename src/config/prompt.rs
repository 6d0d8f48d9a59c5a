//! Prompt pattern resolution
//!
//! Maps prompt type names to compiled regexes. Every pattern is anchored at
//! the end of the text it is tested against, so a prompt only counts when it
//! is the last thing a program printed.

use super::{PromptTypeConfig, OTHER_PROMPT};
use crate::error::{Error, Result};
use regex::Regex;

/// A compiled prompt pattern
#[derive(Debug, Clone)]
pub struct PromptPattern {
    source: String,
    regex: Regex,
}

impl PromptPattern {
    /// Compile a pattern, anchoring it at the end of the input
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(&format!("(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Pattern text as configured
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the text ends with this prompt
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for PromptPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Prompt type name to pattern resolver
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    entries: Vec<(String, Option<PromptPattern>)>,
}

impl PromptCatalog {
    /// Build from configured prompt types
    ///
    /// Fails when a pattern does not compile, a name repeats, or a type other
    /// than "other" lacks a pattern.
    pub fn from_config(prompts: &[PromptTypeConfig]) -> Result<Self> {
        let mut entries: Vec<(String, Option<PromptPattern>)> = Vec::with_capacity(prompts.len());

        for prompt in prompts {
            let field = format!("prompts.{}", prompt.name);

            if prompt.name.trim().is_empty() {
                return Err(Error::ConfigValidationFailed {
                    field: "prompts".to_string(),
                    reason: "Prompt type name cannot be empty".to_string(),
                });
            }

            if entries.iter().any(|(name, _)| name == &prompt.name) {
                return Err(Error::ConfigValidationFailed {
                    field,
                    reason: "Prompt type declared more than once".to_string(),
                });
            }

            let pattern = match (&prompt.pattern, prompt.name == OTHER_PROMPT) {
                (Some(source), _) => Some(PromptPattern::new(source).map_err(|e| {
                    Error::ConfigValidationFailed {
                        field: field.clone(),
                        reason: e.to_string(),
                    }
                })?),
                (None, true) => None,
                (None, false) => {
                    return Err(Error::ConfigValidationFailed {
                        field,
                        reason: "Prompt pattern is required".to_string(),
                    })
                }
            };

            entries.push((prompt.name.clone(), pattern));
        }

        Ok(Self { entries })
    }

    /// Pattern for a prompt type
    ///
    /// Returns `Ok(None)` for a declared type without a pattern and
    /// `UnknownPromptType` for an undeclared one.
    pub fn resolve(&self, prompt_type: &str) -> Result<Option<&PromptPattern>> {
        self.entries
            .iter()
            .find(|(name, _)| name == prompt_type)
            .map(|(_, pattern)| pattern.as_ref())
            .ok_or_else(|| Error::UnknownPromptType {
                prompt_type: prompt_type.to_string(),
            })
    }

    pub fn contains(&self, prompt_type: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == prompt_type)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
