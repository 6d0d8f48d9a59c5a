//! Unix-specific platform implementations

mod filesystem;
mod paths;
mod signals;

pub use filesystem::UnixFilesystem;
pub use paths::UnixPaths;
pub use signals::UnixSignals;
