//! PTY Process Spawning
//!
//! Spawns the session shell on a new pseudoterminal with the portable-pty
//! crate and starts the reader and writer threads behind [`PtyStreams`].

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::sync::mpsc::channel;
use std::thread;
use tokio::sync::mpsc::unbounded_channel;

use super::streams::{PtyStreams, WriteRequest};
use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// The spawned child and the master side of its terminal
pub struct PtyChild {
    pub child: Box<dyn Child + Send + Sync>,
    /// Kept open for the life of the session; dropping it hangs up the child
    pub master: Box<dyn MasterPty + Send>,
}

/// Spawn the configured shell on a new PTY
pub fn spawn_pty_process(config: &SessionConfig) -> Result<(PtyChild, PtyStreams)> {
    let command_line = config.command_line();

    // Get the native PTY system
    let pty_system = native_pty_system();

    // Create a new PTY pair
    let pair = pty_system
        .openpty(PtySize {
            rows: config.rows,
            cols: config.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| Error::PtyCreationFailed {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

    // Build the command
    let mut cmd_builder = CommandBuilder::new(&config.shell);
    cmd_builder.args(&config.shell_args);
    for (key, value) in &config.env {
        cmd_builder.env(key, value);
    }
    if let Ok(cwd) = std::env::current_dir() {
        cmd_builder.cwd(cwd);
    }

    // Spawn the process
    let child = pair
        .slave
        .spawn_command(cmd_builder)
        .map_err(|e| Error::CommandSpawnFailed {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

    // The child holds its own copy of the slave; ours would keep the reader
    // from seeing EOF when the child exits
    drop(pair.slave);

    debug!(
        "Spawned '{}' on PTY (pid {:?})",
        command_line,
        child.process_id()
    );

    let streams = create_pty_streams(pair.master.as_ref())?;

    Ok((
        PtyChild {
            child,
            master: pair.master,
        },
        streams,
    ))
}

/// Create PTY streams from the master side
fn create_pty_streams(master: &dyn MasterPty) -> Result<PtyStreams> {
    let mut master_reader = master
        .try_clone_reader()
        .map_err(|e| Error::PtyReaderCloneFailed {
            reason: e.to_string(),
        })?;
    let mut master_writer = master
        .take_writer()
        .map_err(|e| Error::PtyWriterTakeFailed {
            reason: e.to_string(),
        })?;

    // Channel: PTY output -> async consumer
    let (tx_async_out, rx_async_out) = unbounded_channel::<Vec<u8>>();
    // Channel: async producer -> PTY writer thread
    let (tx_input, rx_input) = channel::<WriteRequest>();

    // Reader thread: read from PTY master and forward to async channel
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut consecutive_errors = 0;
        const MAX_CONSECUTIVE_ERRORS: u32 = 5;

        loop {
            match master_reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY read EOF - process terminated");
                    break;
                }
                Ok(n) => {
                    consecutive_errors = 0;
                    if tx_async_out.send(buf[..n].to_vec()).is_err() {
                        debug!("PTY read: receiver dropped, stopping reader thread");
                        break;
                    }
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }

                    if e.kind() == std::io::ErrorKind::WouldBlock {
                        std::thread::sleep(std::time::Duration::from_millis(10));
                        continue;
                    }

                    // Linux reports EIO on the master once the child side is gone
                    consecutive_errors += 1;
                    debug!(
                        "PTY read error ({}): {} (attempt {}/{})",
                        e.kind(),
                        e,
                        consecutive_errors,
                        MAX_CONSECUTIVE_ERRORS
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        break;
                    }

                    std::thread::sleep(std::time::Duration::from_millis(50));
                }
            }
        }
        debug!("PTY reader thread exiting");
    });

    // Writer thread: write each request and acknowledge the outcome
    thread::spawn(move || {
        while let Ok(request) = rx_input.recv() {
            let mut attempts = 0;
            const MAX_ATTEMPTS: u32 = 3;

            let outcome = loop {
                match master_writer
                    .write_all(&request.data)
                    .and_then(|()| master_writer.flush())
                {
                    Ok(()) => break Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e)
                        if e.kind() == std::io::ErrorKind::WouldBlock && attempts < MAX_ATTEMPTS =>
                    {
                        attempts += 1;
                        std::thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(e) => break Err(e),
                }
            };

            if let Err(e) = &outcome {
                warn!("PTY write error ({}): {}", e.kind(), e);
            }

            // The requester may have given up waiting
            let _ = request.ack.send(outcome);
        }
        debug!("PTY writer thread exiting");
    });

    Ok(PtyStreams::from_channels(rx_async_out, tx_input))
}
