//! Foreground subprocess execution
//!
//! Bash-rooted commands run as blocking child processes when no bash session
//! is live. The child inherits the console's stdio.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Runs command text as foreground child processes
#[async_trait]
pub trait ForegroundRunner: Send + Sync {
    /// Execute an argument vector directly
    async fn run_argv(&self, argv: &[String]) -> Result<Option<i32>>;

    /// Execute one line through `sh -c`
    async fn run_shell(&self, command: &str) -> Result<Option<i32>>;

    /// Feed lines into a fresh interactive shell, then close its stdin
    async fn run_lines(&self, lines: &[String]) -> Result<Option<i32>>;
}

/// Runner backed by `tokio::process`
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    /// Shell used for multi-line payloads
    interactive_shell: PathBuf,
}

impl SubprocessRunner {
    pub fn new(interactive_shell: PathBuf) -> Self {
        Self { interactive_shell }
    }

    async fn wait(mut command: Command, label: &str) -> Result<Option<i32>> {
        let status = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| Error::ForegroundExecutionFailed {
                command: label.to_string(),
                reason: e.to_string(),
            })?;
        Ok(status.code())
    }
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new(PathBuf::from("/bin/bash"))
    }
}

#[async_trait]
impl ForegroundRunner for SubprocessRunner {
    async fn run_argv(&self, argv: &[String]) -> Result<Option<i32>> {
        let (program, args) = argv.split_first().ok_or_else(|| Error::UnsupportedPayload {
            command: String::new(),
            reason: "empty command".to_string(),
        })?;

        debug!("Running '{}' in the foreground", program);
        let mut command = Command::new(program);
        command.args(args);
        Self::wait(command, program).await
    }

    async fn run_shell(&self, text: &str) -> Result<Option<i32>> {
        debug!("Running '{}' through sh -c", text);
        let mut command = Command::new("sh");
        command.arg("-c").arg(text);
        Self::wait(command, text).await
    }

    async fn run_lines(&self, lines: &[String]) -> Result<Option<i32>> {
        let label = format!("{} -i", self.interactive_shell.display());
        let spawn_error = |e: std::io::Error| Error::ForegroundExecutionFailed {
            command: label.clone(),
            reason: e.to_string(),
        };

        let mut child = Command::new(&self.interactive_shell)
            .arg("-i")
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            for line in lines {
                stdin.write_all(line.as_bytes()).await.map_err(spawn_error)?;
                stdin.write_all(b"\n").await.map_err(spawn_error)?;
            }
            stdin.flush().await.map_err(spawn_error)?;
            // stdin drops here, so the shell sees EOF and exits
        }

        let status = child.wait().await.map_err(spawn_error)?;
        Ok(status.code())
    }
}
