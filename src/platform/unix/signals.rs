//! Unix signal operations

use crate::error::{Error, Result};
use crate::platform::traits::SignalOps;
use nix::sys::signal::{kill, Signal as NixSignal};
use nix::unistd::Pid;

pub struct UnixSignals;

impl UnixSignals {
    pub fn new() -> Self {
        Self
    }

    fn send(pid: u32, signal: NixSignal) -> Result<()> {
        kill(Pid::from_raw(pid as i32), signal).map_err(|e| Error::SignalSendFailed {
            signal: signal.as_str().to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SignalOps for UnixSignals {
    async fn send_hangup(&self, pid: u32) -> Result<()> {
        Self::send(pid, NixSignal::SIGHUP)
    }

    fn is_process_running(&self, pid: u32) -> bool {
        // Null signal: permission and existence check only
        kill(Pid::from_raw(pid as i32), None).is_ok()
    }
}
