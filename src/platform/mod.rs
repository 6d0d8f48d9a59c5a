//! Platform abstraction layer
//!
//! Signals, command lookup and standard directories, plus the name of the
//! platform tools are matched against.

mod traits;
#[cfg(unix)]
mod unix;

pub use traits::*;

/// Platform name reported for unrecognized operating systems
pub const UNKNOWN_PLATFORM: &str = "UNKNOWN PLATFORM";

/// Name of the platform this process runs on, as tool files spell it
pub fn runtime_platform() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        _ => UNKNOWN_PLATFORM,
    }
}

/// Platform implementation factory
pub struct Platform;

impl Platform {
    /// Get the platform-specific signal operations
    pub fn signals() -> Box<dyn SignalOps> {
        #[cfg(unix)]
        {
            Box::new(unix::UnixSignals::new())
        }

        #[cfg(not(unix))]
        {
            compile_error!("Unsupported platform");
        }
    }

    /// Get the platform-specific filesystem operations
    pub fn filesystem() -> Box<dyn FilesystemOps> {
        #[cfg(unix)]
        {
            Box::new(unix::UnixFilesystem::new())
        }

        #[cfg(not(unix))]
        {
            compile_error!("Unsupported platform");
        }
    }

    /// Get the platform-specific path operations
    pub fn paths() -> Box<dyn PathOps> {
        #[cfg(unix)]
        {
            Box::new(unix::UnixPaths::new())
        }

        #[cfg(not(unix))]
        {
            compile_error!("Unsupported platform");
        }
    }
}
