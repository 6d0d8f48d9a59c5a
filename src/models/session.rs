//! Session Handle Model
//!
//! One live interactive process and the prompt type it currently presents.

use crate::config::PromptPattern;
use crate::pty::SessionIo;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A live session owned by the registry
pub struct SessionHandle {
    id: Uuid,
    prompt_type: String,
    prompt_pattern: Option<PromptPattern>,
    process: Box<dyn SessionIo>,
    started_at: DateTime<Utc>,
}

impl SessionHandle {
    pub fn new(
        process: Box<dyn SessionIo>,
        prompt_type: &str,
        prompt_pattern: Option<PromptPattern>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt_type: prompt_type.to_string(),
            prompt_pattern,
            process,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Prompt type the session currently presents
    pub fn prompt_type(&self) -> &str {
        &self.prompt_type
    }

    pub fn prompt_pattern(&self) -> Option<&PromptPattern> {
        self.prompt_pattern.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn process(&self) -> &dyn SessionIo {
        self.process.as_ref()
    }

    pub fn process_mut(&mut self) -> &mut dyn SessionIo {
        self.process.as_mut()
    }

    /// Record the prompt type the session presents after a transmission
    pub fn retarget(&mut self, prompt_type: &str, prompt_pattern: Option<PromptPattern>) {
        self.prompt_type = prompt_type.to_string();
        self.prompt_pattern = prompt_pattern;
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("prompt_type", &self.prompt_type)
            .field("pid", &self.process.pid())
            .field("started_at", &self.started_at)
            .finish()
    }
}
