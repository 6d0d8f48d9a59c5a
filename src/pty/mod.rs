//! Pseudoterminal (PTY) Sessions
//!
//! Interactive shell processes on pseudoterminals. Blocking PTY I/O runs on
//! background threads and is bridged to async code through channels.
//!
//! The dispatcher only sees the [`SessionIo`] and [`SessionSpawner`] traits,
//! so tests can drive it with scripted sessions instead of real shells.

pub mod process;
pub mod session;
pub mod streams;

pub use process::{spawn_pty_process, PtyChild};
pub use session::{PtySession, PtySpawner};
pub use streams::PtyStreams;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Result of one bounded line read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A complete line, without its line terminator
    Line(String),
    /// No complete line arrived before the timeout
    Timeout,
    /// The process closed its side of the terminal
    Closed,
}

/// I/O with one live interactive process
#[async_trait]
pub trait SessionIo: Send {
    /// Write one line followed by a newline
    async fn send_line(&mut self, line: &str) -> Result<()>;

    /// Wait up to `timeout` for the next complete line
    async fn read_line(&mut self, timeout: Duration) -> Result<ReadEvent>;

    /// Output received after the last complete line
    fn pending(&self) -> String;

    /// Take the incomplete trailing output, leaving it empty
    fn take_pending(&mut self) -> String;

    /// Collect everything already received without waiting
    fn drain(&mut self) -> String;

    /// OS process id, when known
    fn pid(&self) -> Option<u32>;

    /// Whether the process is still running
    fn is_alive(&mut self) -> bool;
}

/// Creates shell sessions for bash-rooted tasks
#[async_trait]
pub trait SessionSpawner: Send + Sync {
    async fn spawn_shell(&self) -> Result<Box<dyn SessionIo>>;
}
