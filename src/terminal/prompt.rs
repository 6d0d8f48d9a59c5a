//! Prompt Detection Logic
//!
//! Streams session output line by line and decides when the program has
//! settled at a new prompt.
//!
//! Each read either yields a line or times out. A timeout is an observation
//! cycle: the trailing, incomplete output is tested against the ending
//! prompt's pattern. A match must hold for `pattern_cycles` further cycles
//! before it is accepted, which keeps a prompt-like fragment in the middle of
//! slow output from ending the read early. After `safety_cycles` silent,
//! non-matching cycles an empty line is sent to make the program redraw its
//! prompt.

use super::output::strip_ansi_codes;
use crate::config::{PromptPattern, TimeoutConfig};
use crate::error::{Error, Result};
use crate::pty::{ReadEvent, SessionIo};
use std::io::Write;

/// What one read produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// A complete line arrived
    Line,
    /// The read timed out; `matched` tells whether the trailing output ends
    /// with the prompt
    Timeout { matched: bool },
}

/// What the reader does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep reading
    Continue,
    /// The prompt is stable; stop reading
    Accept,
    /// Send an empty line, then keep reading
    Nudge,
    /// The prompt ceiling was reached
    GiveUp,
}

/// Debounce state for one read loop
#[derive(Debug, Clone)]
pub struct PromptDebouncer {
    pattern_cycles: u32,
    safety_cycles: u32,
    ceiling: Option<u32>,
    confirmations: u32,
    safety: u32,
    silent: u32,
}

impl PromptDebouncer {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        Self {
            pattern_cycles: timeouts.pattern_cycles,
            safety_cycles: timeouts.safety_cycles,
            ceiling: timeouts.prompt_ceiling_cycles,
            confirmations: 0,
            safety: 0,
            silent: 0,
        }
    }

    pub fn observe(&mut self, observation: Observation) -> Decision {
        match observation {
            Observation::Line => {
                self.confirmations = 0;
                self.safety = 0;
                Decision::Continue
            }
            Observation::Timeout { matched: true } => {
                if self.confirmations >= self.pattern_cycles {
                    return Decision::Accept;
                }
                self.confirmations += 1;
                self.silent_cycle()
            }
            Observation::Timeout { matched: false } => {
                self.confirmations = 0;
                self.safety += 1;
                if self.safety >= self.safety_cycles {
                    self.safety = 0;
                    if self.ceiling_reached() {
                        return Decision::GiveUp;
                    }
                    return Decision::Nudge;
                }
                self.silent_cycle()
            }
        }
    }

    fn silent_cycle(&mut self) -> Decision {
        if self.ceiling_reached() {
            Decision::GiveUp
        } else {
            Decision::Continue
        }
    }

    fn ceiling_reached(&mut self) -> bool {
        self.silent += 1;
        self.ceiling.is_some_and(|ceiling| self.silent >= ceiling)
    }

    /// Consecutive matching cycles so far
    pub fn confirmations(&self) -> u32 {
        self.confirmations
    }

    /// Consecutive non-matching cycles since the last line or nudge
    pub fn safety(&self) -> u32 {
        self.safety
    }

    /// Timeout cycles during this read; lines do not reset it, since a
    /// nudged terminal echoes one
    pub fn silent_cycles(&self) -> u32 {
        self.silent
    }
}

/// Read session output into `out` until the prompt is accepted
///
/// Lines are written as they arrive. On acceptance the trailing prompt text
/// is written too. Fails with `SessionClosed` when the process exits and
/// with `PromptNotDetected` when the ceiling is reached.
pub async fn read_until_prompt(
    session: &mut dyn SessionIo,
    pattern: &PromptPattern,
    prompt_type: &str,
    timeouts: &TimeoutConfig,
    out: &mut (dyn Write + Send),
) -> Result<()> {
    let mut debouncer = PromptDebouncer::new(timeouts);
    let read_timeout = timeouts.read_timeout();
    let pause = timeouts.cycle_pause();

    loop {
        let observation = match session.read_line(read_timeout).await? {
            ReadEvent::Line(line) => {
                writeln!(out, "{}", line)?;
                Observation::Line
            }
            ReadEvent::Timeout => Observation::Timeout {
                matched: pattern.is_match(&strip_ansi_codes(&session.pending())),
            },
            ReadEvent::Closed => {
                let rest = session.take_pending();
                if !rest.is_empty() {
                    writeln!(out, "{}", rest)?;
                }
                out.flush()?;
                warn!("Session '{}' closed while reading output", prompt_type);
                return Err(Error::SessionClosed {
                    prompt_type: prompt_type.to_string(),
                });
            }
        };

        match debouncer.observe(observation) {
            Decision::Continue => {}
            Decision::Accept => {
                writeln!(out, "{}", session.take_pending())?;
                out.flush()?;
                debug!("Accepted '{}' prompt", prompt_type);
                return Ok(());
            }
            Decision::Nudge => {
                debug!("No '{}' prompt yet, sending empty line", prompt_type);
                session.send_line("").await?;
            }
            Decision::GiveUp => {
                out.flush()?;
                let cycles = debouncer.silent_cycles();
                warn!("Gave up waiting for '{}' prompt after {} cycles", prompt_type, cycles);
                return Err(Error::PromptNotDetected {
                    prompt_type: prompt_type.to_string(),
                    cycles,
                });
            }
        }

        if matches!(observation, Observation::Timeout { .. }) {
            out.flush()?;
            if let Some(pause) = pause {
                tokio::time::sleep(pause).await;
            }
        }
    }
}
