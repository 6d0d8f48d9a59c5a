//! Test Utilities and Mocks
//!
//! Scripted sessions that behave like a terminal showing a prompt, a spawner
//! handing them out, and a shared output sink.

#![allow(dead_code)]

use async_trait::async_trait;
use promptmux::config::{Config, PromptCatalog, TimeoutConfig};
use promptmux::dispatch::Dispatcher;
use promptmux::error::{Error, Result};
use promptmux::platform::SignalOps;
use promptmux::pty::{ReadEvent, SessionIo, SessionSpawner};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASH_PROMPT_TEXT: &str = "user@host:~$ ";
pub const MSF_PROMPT_TEXT: &str = "msf6 > ";

/// Observable state of one mock session
#[derive(Debug, Default)]
pub struct MockState {
    pub pid: u32,
    pub sent: Vec<String>,
    pub alive: bool,
    /// Prompt the fake program shows after handling a line
    pub prompt: String,
    /// Sent line -> prompt shown afterwards
    pub transitions: HashMap<String, String>,
    /// Sent lines that make the fake program exit
    pub exits_on: Vec<String>,
    /// Sent line -> output lines printed before the prompt
    pub replies: HashMap<String, Vec<String>>,
    pub output: VecDeque<String>,
    pub pending: String,
    /// Write failures are simulated when set
    pub broken_pipe: bool,
}

impl MockState {
    pub fn shell() -> Self {
        let mut transitions = HashMap::new();
        transitions.insert("msfconsole".to_string(), MSF_PROMPT_TEXT.to_string());
        transitions.insert("python3".to_string(), ">>> ".to_string());
        transitions.insert("exit".to_string(), BASH_PROMPT_TEXT.to_string());
        transitions.insert("hang".to_string(), "Loading...".to_string());

        let mut replies = HashMap::new();
        replies.insert(
            "ls -la".to_string(),
            vec!["total 0".to_string(), "drwxr-xr-x 2 user user 40 .".to_string()],
        );

        Self {
            alive: true,
            prompt: BASH_PROMPT_TEXT.to_string(),
            transitions,
            exits_on: vec!["logout".to_string()],
            replies,
            pending: BASH_PROMPT_TEXT.to_string(),
            ..Self::default()
        }
    }
}

pub type SharedState = Arc<Mutex<MockState>>;

/// Session driven by a [`MockState`]; reads never block
pub struct MockSession {
    state: SharedState,
}

impl MockSession {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl SessionIo for MockSession {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.broken_pipe || !state.alive {
            return Err(Error::PtyInputSendFailed {
                session: state.pid.to_string(),
                reason: "broken pipe".to_string(),
            });
        }

        state.sent.push(line.to_string());
        let echoed = format!("{}{}", std::mem::take(&mut state.pending), line);
        state.output.push_back(echoed);
        if let Some(reply) = state.replies.get(line).cloned() {
            state.output.extend(reply);
        }

        if state.exits_on.iter().any(|l| l == line) {
            state.alive = false;
            return Ok(());
        }
        if let Some(prompt) = state.transitions.get(line).cloned() {
            state.prompt = prompt;
        }
        state.pending = state.prompt.clone();
        Ok(())
    }

    async fn read_line(&mut self, _timeout: Duration) -> Result<ReadEvent> {
        let mut state = self.state.lock().unwrap();
        if let Some(line) = state.output.pop_front() {
            return Ok(ReadEvent::Line(line));
        }
        if !state.alive {
            return Ok(ReadEvent::Closed);
        }
        Ok(ReadEvent::Timeout)
    }

    fn pending(&self) -> String {
        self.state.lock().unwrap().pending.clone()
    }

    fn take_pending(&mut self) -> String {
        std::mem::take(&mut self.state.lock().unwrap().pending)
    }

    fn drain(&mut self) -> String {
        let mut state = self.state.lock().unwrap();
        let mut text: String = state
            .output
            .drain(..)
            .map(|line| format!("{}\n", line))
            .collect();
        text.push_str(&std::mem::take(&mut state.pending));
        text
    }

    fn pid(&self) -> Option<u32> {
        Some(self.state.lock().unwrap().pid)
    }

    fn is_alive(&mut self) -> bool {
        self.state.lock().unwrap().alive
    }
}

/// Spawner handing out [`MockSession`]s and keeping their state for inspection
#[derive(Clone)]
pub struct MockSpawner {
    pub sessions: Arc<Mutex<Vec<SharedState>>>,
    pub fail: Arc<Mutex<bool>>,
    next_pid: Arc<AtomicU32>,
}

impl MockSpawner {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
            next_pid: Arc::new(AtomicU32::new(4000)),
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// State of the n-th spawned session
    pub fn session(&self, index: usize) -> SharedState {
        self.sessions.lock().unwrap()[index].clone()
    }

    pub fn sent(&self, index: usize) -> Vec<String> {
        self.session(index).lock().unwrap().sent.clone()
    }

    pub fn fail_spawns(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl SessionSpawner for MockSpawner {
    async fn spawn_shell(&self) -> Result<Box<dyn SessionIo>> {
        if *self.fail.lock().unwrap() {
            return Err(Error::PtyCreationFailed {
                command: "/bin/bash -i".to_string(),
                reason: "mock spawn failure".to_string(),
            });
        }
        let mut state = MockState::shell();
        state.pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let state = Arc::new(Mutex::new(state));
        self.sessions.lock().unwrap().push(state.clone());
        Ok(Box::new(MockSession::new(state)))
    }
}

/// Cloneable in-memory output sink
#[derive(Clone, Default)]
pub struct SharedBuffer {
    data: Arc<Mutex<Vec<u8>>>,
    failing: Arc<AtomicBool>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.data.lock().unwrap()).into_owned()
    }

    /// Make every following write fail, or succeed again
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "output busy",
            ));
        }
        self.data.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Signal sink recording the pids it was asked to hang up
#[derive(Clone, Default)]
pub struct RecordingSignals {
    pub hangups: Arc<Mutex<Vec<u32>>>,
    pub gone: Arc<Mutex<Vec<u32>>>,
}

impl RecordingSignals {
    /// Report `pid` as no longer running
    pub fn mark_gone(&self, pid: u32) {
        self.gone.lock().unwrap().push(pid);
    }

    pub fn hangups(&self) -> Vec<u32> {
        self.hangups.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalOps for RecordingSignals {
    async fn send_hangup(&self, pid: u32) -> Result<()> {
        self.hangups.lock().unwrap().push(pid);
        Ok(())
    }

    fn is_process_running(&self, pid: u32) -> bool {
        !self.gone.lock().unwrap().contains(&pid)
    }
}

/// Fast timeouts with a ceiling, so a missing prompt fails instead of hanging
pub fn test_timeouts() -> TimeoutConfig {
    TimeoutConfig {
        pattern_cycles: 2,
        read_timeout_secs: 0.01,
        safety_cycles: 10,
        cycle_pause_ms: 0,
        prompt_ceiling_cycles: Some(25),
    }
}

pub fn test_prompts() -> PromptCatalog {
    PromptCatalog::from_config(&Config::default().prompts).unwrap()
}

/// Dispatcher over mock sessions, plus handles to inspect them
pub fn mock_dispatcher() -> (Dispatcher, MockSpawner, SharedBuffer) {
    let spawner = MockSpawner::new();
    let out = SharedBuffer::new();
    let dispatcher = Dispatcher::new(
        test_prompts(),
        test_timeouts(),
        Box::new(spawner.clone()),
        Box::new(out.clone()),
    );
    (dispatcher, spawner, out)
}
