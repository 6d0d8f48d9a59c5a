//! Interactive Task Model
//!
//! A request to transmit text into the session currently presenting
//! `starting_prompt`, after which the session presents `ending_prompt`.

use super::Payload;
use crate::config::{PromptCatalog, PromptPattern};
use crate::error::{Error, Result};

/// Immutable unit of work for the dispatcher
#[derive(Debug, Clone)]
pub struct InteractiveTask {
    text: Payload,
    starting_prompt: String,
    ending_prompt: String,
    prompt_change: bool,
    ending_prompt_pattern: PromptPattern,
}

impl InteractiveTask {
    /// Create a task, resolving the pattern of the prompt it ends in
    ///
    /// Fails with `UnknownPromptType` for an undeclared prompt type and with
    /// `PromptPatternMissing` when the ending prompt has no pattern.
    pub fn new(
        text: Payload,
        starting_prompt: &str,
        ending_prompt: &str,
        prompts: &PromptCatalog,
    ) -> Result<Self> {
        prompts.resolve(starting_prompt)?;

        let prompt_change = starting_prompt != ending_prompt;
        let target = if prompt_change {
            ending_prompt
        } else {
            starting_prompt
        };

        let ending_prompt_pattern = prompts
            .resolve(target)?
            .cloned()
            .ok_or_else(|| Error::PromptPatternMissing {
                prompt_type: target.to_string(),
            })?;

        Ok(Self {
            text,
            starting_prompt: starting_prompt.to_string(),
            ending_prompt: ending_prompt.to_string(),
            prompt_change,
            ending_prompt_pattern,
        })
    }

    pub fn text(&self) -> &Payload {
        &self.text
    }

    pub fn starting_prompt(&self) -> &str {
        &self.starting_prompt
    }

    pub fn ending_prompt(&self) -> &str {
        &self.ending_prompt
    }

    /// Whether the session's prompt type changes with this task
    pub fn prompt_change(&self) -> bool {
        self.prompt_change
    }

    pub fn ending_prompt_pattern(&self) -> &PromptPattern {
        &self.ending_prompt_pattern
    }
}
