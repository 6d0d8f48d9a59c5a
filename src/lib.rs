//! promptmux - an operator console for command-line security tools
//!
//! Tools are cataloged from YAML files, each entry declaring the prompt type
//! it must be typed at (`bash`, a framework console such as `msf`, ...) and
//! how it executes. Bash-rooted commands run as foreground subprocesses;
//! everything else becomes a turn in a persistent pseudo-terminal session.
//! At most one live session exists per prompt type.
//!
//! ## Module Organization
//!
//! ### Core
//!
//! - [`dispatch`] - Session registry and the task router
//! - [`execution`] - Execution-type routing, foreground runner, PTF installs
//! - [`terminal`] - Prompt detection on session output
//! - [`pty`] - PTY-backed session processes
//! - [`models`] - Tools, interactive tasks, session handles
//!
//! ### Support
//!
//! - [`catalog`] - Tool file loading and command-text building
//! - [`config`] - Configuration loading and validation
//! - [`app`] - The interactive console and subcommands
//! - [`platform`] - Signals, command lookup, standard directories
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use promptmux::{app::{Console, LineOperator}, ConfigLoader};
//! use std::sync::Arc;
//!
//! # async fn demo() -> promptmux::Result<()> {
//! let config = ConfigLoader::load()?;
//! let mut console = Console::from_config(&config, Arc::new(LineOperator::stdio()))?;
//! console.run().await?;
//! console.shutdown(promptmux::platform::Platform::signals().as_ref()).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! One logical thread of control drives the menu and every dispatch. Each
//! PTY gets a blocking reader thread and a blocking writer thread, bridged to
//! the async side through channels.

#[macro_use]
extern crate tracing;

pub mod app;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod execution;
pub mod models;
pub mod platform;
pub mod pty;
pub mod terminal;

// Re-exports for core functionality
pub use config::loader::ConfigLoader;
pub use config::{Config, PromptCatalog};
pub use dispatch::{Dispatcher, Outcome, SessionRegistry};
pub use error::{Error, ErrorCategory, Result};
pub use execution::Executor;

/// The current version of promptmux from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
