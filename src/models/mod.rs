//! Core data models for promptmux
//!
//! Cataloged tools and their entries, interactive tasks, and the session
//! handles the dispatcher keeps per prompt type.

pub mod session;
pub mod task;
pub mod tool;

// Re-exports for convenience
pub use session::SessionHandle;
pub use task::InteractiveTask;
pub use tool::{
    Action, Command, Entry, EntryInfo, ExecutionType, InputSpec, OutputSpec, Payload,
    ResolvedCommand, Tool,
};
