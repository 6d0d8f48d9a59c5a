//! Configuration management for promptmux
//!
//! Prompt types, read-loop timeouts, session shell settings, data folders and
//! the placeholder input types recognized in tool command text.

pub mod loader;
pub mod prompt;

pub use loader::{ConfigFormat, ConfigLoader, LoadOptions};
pub use prompt::{PromptCatalog, PromptPattern};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Prompt type rooted in a real shell process
pub const BASH_PROMPT: &str = "bash";

/// Reserved prompt type that never has a pattern or a session
pub const OTHER_PROMPT: &str = "other";

/// Main configuration structure for promptmux
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Known prompt types, in declaration order
    pub prompts: Vec<PromptTypeConfig>,

    /// Output reader timing
    pub timeouts: TimeoutConfig,

    /// Shell sessions spawned for bash-rooted tasks
    pub session: SessionConfig,

    /// Data folders
    pub folders: FolderConfig,

    /// Placeholder types allowed in command text, e.g. `{IPV4}`
    pub input_types: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompts: vec![
                PromptTypeConfig::new(BASH_PROMPT, Some(r"[#$] ")),
                PromptTypeConfig::new("msf", Some(r"msf\d? [^>]*> ")),
                PromptTypeConfig::new("meterpreter", Some(r"meterpreter > ")),
                PromptTypeConfig::new("python", Some(r">>> ")),
                PromptTypeConfig::new(OTHER_PROMPT, None),
            ],
            timeouts: TimeoutConfig::default(),
            session: SessionConfig::default(),
            folders: FolderConfig::default(),
            input_types: [
                "STR", "INT", "IPV4", "IPV6", "IPV4RNGE", "IPV6RNGE", "IPV4CIDR", "IPV6CIDR",
                "MAC", "FILE", "RLATVPTH", "FULLPATH", "DOMAIN", "HTTPURL", "HTTPSURL", "WEBURL",
                "STRMENU", "INTMENU",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// One prompt type: a name and the regex that recognizes its prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTypeConfig {
    pub name: String,

    /// Absent only for the reserved "other" type
    #[serde(default)]
    pub pattern: Option<String>,
}

impl PromptTypeConfig {
    pub fn new(name: &str, pattern: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.map(str::to_string),
        }
    }
}

/// Timing of the output reader loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Consecutive matching timeout cycles required before a prompt is accepted
    pub pattern_cycles: u32,

    /// Per-read timeout in seconds
    pub read_timeout_secs: f64,

    /// Consecutive non-matching timeout cycles before an empty line is sent
    pub safety_cycles: u32,

    /// Pause after every timeout cycle, in milliseconds
    pub cycle_pause_ms: u64,

    /// Timeout cycles in one read after which the task fails; unbounded when unset
    pub prompt_ceiling_cycles: Option<u32>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            pattern_cycles: 2,
            read_timeout_secs: 0.5,
            safety_cycles: 10,
            cycle_pause_ms: 0,
            prompt_ceiling_cycles: None,
        }
    }
}

impl TimeoutConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.read_timeout_secs)
    }

    pub fn cycle_pause(&self) -> Option<Duration> {
        (self.cycle_pause_ms > 0).then(|| Duration::from_millis(self.cycle_pause_ms))
    }
}

/// Shell sessions spawned for bash-rooted tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Shell executable path
    pub shell: PathBuf,

    /// Shell arguments
    pub shell_args: Vec<String>,

    /// Pseudo-terminal rows
    pub rows: u16,

    /// Pseudo-terminal columns
    pub cols: u16,

    /// Extra environment variables for the shell
    pub env: HashMap<String, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/bash"),
            shell_args: vec!["-i".to_string()],
            rows: 24,
            cols: 120,
            env: HashMap::new(),
        }
    }
}

impl SessionConfig {
    /// Shell command line for log messages
    pub fn command_line(&self) -> String {
        let mut line = self.shell.display().to_string();
        for arg in &self.shell_args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Data folders used by the catalog and the package framework
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    /// Root of the toolkit folders holding tool files
    pub inventory: PathBuf,

    /// PenTesters Framework checkout
    pub ptf: PathBuf,
}

impl Default for FolderConfig {
    fn default() -> Self {
        let base = crate::platform::Platform::paths()
            .data_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("promptmux");
        Self {
            inventory: base.join("inventory"),
            ptf: base.join("ptf"),
        }
    }
}

impl Config {
    /// Prompt type names in declaration order
    pub fn prompt_names(&self) -> impl Iterator<Item = &str> {
        self.prompts.iter().map(|p| p.name.as_str())
    }
}
