//! Terminal output handling: escape stripping and prompt detection

pub mod output;
pub mod prompt;

pub use output::strip_ansi_codes;
pub use prompt::{read_until_prompt, Decision, Observation, PromptDebouncer};
