//! Session registry
//!
//! Live sessions keyed by the prompt type they currently present. A handle is
//! always stored under its own prompt type, so changing a session's prompt
//! type means taking it out, retargeting it, and inserting it again.

use crate::error::{Error, Result};
use crate::models::SessionHandle;
use std::collections::HashMap;

/// At most one live session per prompt type
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under its current prompt type
    ///
    /// Fails with `DuplicatePromptType` if that type is already taken; the
    /// rejected handle is dropped.
    pub fn insert(&mut self, handle: SessionHandle) -> Result<()> {
        let key = handle.prompt_type().to_string();
        if self.sessions.contains_key(&key) {
            return Err(Error::DuplicatePromptType { prompt_type: key });
        }
        self.sessions.insert(key, handle);
        Ok(())
    }

    pub fn get(&self, prompt_type: &str) -> Option<&SessionHandle> {
        self.sessions.get(prompt_type)
    }

    /// Remove and return the session presenting `prompt_type`
    pub fn take(&mut self, prompt_type: &str) -> Option<SessionHandle> {
        self.sessions.remove(prompt_type)
    }

    pub fn contains(&self, prompt_type: &str) -> bool {
        self.sessions.contains_key(prompt_type)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Registered prompt types, sorted
    pub fn prompt_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.sessions.keys().cloned().collect();
        types.sort();
        types
    }

    /// Drop every session whose process has exited, returning their prompt types
    pub fn remove_closed(&mut self) -> Vec<String> {
        let mut closed: Vec<String> = self
            .sessions
            .iter_mut()
            .filter_map(|(key, handle)| (!handle.process_mut().is_alive()).then(|| key.clone()))
            .collect();
        closed.sort();
        for key in &closed {
            self.sessions.remove(key);
        }
        closed
    }

    /// Remove every session
    pub fn drain(&mut self) -> Vec<SessionHandle> {
        self.sessions.drain().map(|(_, handle)| handle).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionHandle> {
        self.sessions.values()
    }
}
