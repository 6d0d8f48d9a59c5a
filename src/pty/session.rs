//! Real shell sessions on pseudoterminals

use super::process::{spawn_pty_process, PtyChild};
use super::streams::PtyStreams;
use super::{ReadEvent, SessionIo, SessionSpawner};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A live shell process and its terminal streams
pub struct PtySession {
    process: PtyChild,
    streams: PtyStreams,
    label: String,
}

impl PtySession {
    pub fn spawn(config: &SessionConfig) -> Result<Self> {
        let (process, streams) = spawn_pty_process(config)?;
        Ok(Self {
            process,
            streams,
            label: config.command_line(),
        })
    }
}

#[async_trait]
impl SessionIo for PtySession {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');

        self.streams
            .write(&data)
            .await
            .map_err(|e| Error::PtyInputSendFailed {
                session: self.label.clone(),
                reason: e.to_string(),
            })
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<ReadEvent> {
        self.streams.read_line(timeout).await
    }

    fn pending(&self) -> String {
        self.streams.pending()
    }

    fn take_pending(&mut self) -> String {
        self.streams.take_pending()
    }

    fn drain(&mut self) -> String {
        self.streams.drain_output()
    }

    fn pid(&self) -> Option<u32> {
        self.process.child.process_id()
    }

    fn is_alive(&mut self) -> bool {
        !self.streams.is_closed() && matches!(self.process.child.try_wait(), Ok(None))
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        if matches!(self.process.child.try_wait(), Ok(None)) {
            if let Err(e) = self.process.child.kill() {
                debug!("Failed to kill session process: {}", e);
            }
        }
    }
}

/// Spawns the configured shell for each new session
#[derive(Debug, Clone)]
pub struct PtySpawner {
    config: SessionConfig,
}

impl PtySpawner {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionSpawner for PtySpawner {
    async fn spawn_shell(&self) -> Result<Box<dyn SessionIo>> {
        let session = PtySession::spawn(&self.config)?;
        Ok(Box::new(session))
    }
}
