//! PTY Streams
//!
//! Async line-oriented access to a PTY. Output chunks arrive from the reader
//! thread over a channel and collect in a byte buffer until a full line is
//! available; writes go to the writer thread, which acknowledges each one.

use super::ReadEvent;
use crate::error::Result;
use std::io;
use std::sync::mpsc::Sender as StdSender;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};

/// One write handed to the writer thread
pub struct WriteRequest {
    pub data: Vec<u8>,
    pub ack: oneshot::Sender<io::Result<()>>,
}

/// PTY I/O streams wrapper
pub struct PtyStreams {
    /// Receiver for output bytes from the PTY
    output_rx: UnboundedReceiver<Vec<u8>>,
    /// Sender for input bytes to the PTY
    input_tx: StdSender<WriteRequest>,
    /// Output received but not yet returned as a line
    pending: Vec<u8>,
    /// Reader thread has stopped
    closed: bool,
}

impl PtyStreams {
    /// Create new PTY streams from channels
    pub fn from_channels(
        output_rx: UnboundedReceiver<Vec<u8>>,
        input_tx: StdSender<WriteRequest>,
    ) -> Self {
        Self {
            output_rx,
            input_tx,
            pending: Vec::new(),
            closed: false,
        }
    }

    /// Write data to the PTY and wait for the writer thread to finish it
    pub async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let (ack, done) = oneshot::channel();
        self.input_tx
            .send(WriteRequest {
                data: data.to_vec(),
                ack,
            })
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "PTY writer stopped"))?;

        done.await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "PTY writer stopped"))?
    }

    /// Wait up to `timeout` for a complete line
    ///
    /// The timeout bounds the whole call, not each chunk, so a program that
    /// keeps printing without a newline still yields `Timeout`.
    pub async fn read_line(&mut self, timeout: Duration) -> Result<ReadEvent> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(line) = self.take_line() {
                return Ok(ReadEvent::Line(line));
            }

            if self.closed {
                return Ok(ReadEvent::Closed);
            }

            match timeout_at(deadline, self.output_rx.recv()).await {
                Ok(Some(bytes)) => self.pending.extend_from_slice(&bytes),
                Ok(None) => self.closed = true,
                Err(_) => return Ok(ReadEvent::Timeout),
            }
        }
    }

    /// Split the first complete line off the buffer
    fn take_line(&mut self) -> Option<String> {
        let newline = self.pending.iter().position(|&b| b == b'\n')?;
        let rest = self.pending.split_off(newline + 1);
        let mut line = std::mem::replace(&mut self.pending, rest);

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Output received after the last complete line
    pub fn pending(&self) -> String {
        String::from_utf8_lossy(&self.pending).into_owned()
    }

    /// Take the buffered output, leaving the buffer empty
    pub fn take_pending(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Collect everything already received without waiting
    pub fn drain_output(&mut self) -> String {
        loop {
            match self.output_rx.try_recv() {
                Ok(bytes) => self.pending.extend_from_slice(&bytes),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        self.take_pending()
    }

    /// Whether the reader thread has stopped
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
