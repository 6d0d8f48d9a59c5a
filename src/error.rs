//! Error types and Result aliases for promptmux

use std::path::PathBuf;

/// Result type alias for promptmux operations
pub type Result<T> = std::result::Result<T, Error>;

/// How an error affects the running console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad config or catalog data; fatal at startup
    Configuration,
    /// The command cannot run in the current runtime; the command aborts
    Compatibility,
    /// PTY spawn or write failed; the session registry can no longer be trusted
    Transport,
    /// The command has a shape the router does not support; the command aborts
    Unsupported,
    /// A foreground subprocess or the package framework failed
    Execution,
}

/// Main error type for promptmux
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Configuration file not found
    #[error("Configuration file not found")]
    ConfigNotFound,

    /// A tool file could not be read or parsed
    #[error("Failed to load tool file '{}': {reason}", path.display())]
    CatalogLoadFailed { path: PathBuf, reason: String },

    /// A tool file parsed but its content is inconsistent
    #[error("Invalid definition for {tool}: {reason}")]
    InvalidToolDefinition { tool: String, reason: String },

    // === Compatibility errors ===
    /// Tool platform differs from the runtime platform
    #[error("Cannot execute {tool} ({tool_platform}) on {runtime_platform}")]
    PlatformMismatch {
        tool: String,
        tool_platform: String,
        runtime_platform: String,
    },

    /// No live session can service the prompt type
    #[error("Prompt type '{prompt_type}' incompatible with current runtime")]
    IncompatiblePromptType { prompt_type: String },

    /// A session with the target prompt type already exists
    #[error("Cannot create session with prompt type '{prompt_type}': a session of that type already exists")]
    DuplicatePromptType { prompt_type: String },

    /// Prompt type is not declared in the configuration
    #[error("Unknown prompt type '{prompt_type}'")]
    UnknownPromptType { prompt_type: String },

    /// Prompt type has no pattern, so no prompt can be detected for it
    #[error("Prompt type '{prompt_type}' has no prompt pattern and cannot be driven interactively")]
    PromptPatternMissing { prompt_type: String },

    /// The session's process exited while output was being read
    #[error("Session '{prompt_type}' exited before presenting a prompt")]
    SessionClosed { prompt_type: String },

    /// The prompt ceiling was reached without a stable prompt
    #[error("No '{prompt_type}' prompt detected after {cycles} silent read cycles")]
    PromptNotDetected { prompt_type: String, cycles: u32 },

    // === Unsupported-shape errors ===
    /// Multi-line autonomous commands cannot be run
    #[error("Autonomous multi-line commands are unsupported")]
    MultiLineAutonomous,

    /// A payload shape the command cannot take (empty text, missing inputs)
    #[error("Unsupported command text for '{command}': {reason}")]
    UnsupportedPayload { command: String, reason: String },

    // === Transport errors ===
    /// Failed to create PTY
    #[error("Failed to create PTY for command '{command}': {reason}")]
    PtyCreationFailed { command: String, reason: String },

    /// Failed to spawn command in PTY
    #[error("Failed to spawn command '{command}': {reason}")]
    CommandSpawnFailed { command: String, reason: String },

    /// Failed to clone PTY reader
    #[error("Failed to clone PTY reader: {reason}")]
    PtyReaderCloneFailed { reason: String },

    /// Failed to take PTY writer
    #[error("Failed to take PTY writer: {reason}")]
    PtyWriterTakeFailed { reason: String },

    /// Failed to send input to PTY
    #[error("Failed to transmit to session '{session}': {reason}")]
    PtyInputSendFailed { session: String, reason: String },

    // === Execution errors ===
    /// A foreground subprocess could not be started
    #[error("Failed to execute '{command}': {reason}")]
    ForegroundExecutionFailed { command: String, reason: String },

    /// The package framework could not inspect or install a tool
    #[error("Package framework error for {tool}: {reason}")]
    FrameworkFailed { tool: String, reason: String },

    /// Failed to send signal to process
    #[error("Failed to send signal '{signal}': {reason}")]
    SignalSendFailed { signal: String, reason: String },

    // === I/O and serialization errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Regex compilation errors
    #[error("Regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    // === Generic fallback (use sparingly) ===
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ConfigLoadFailed { .. }
            | Error::ConfigParseFailed { .. }
            | Error::ConfigValidationFailed { .. }
            | Error::ConfigNotFound
            | Error::CatalogLoadFailed { .. }
            | Error::InvalidToolDefinition { .. }
            | Error::Json(_)
            | Error::Yaml(_)
            | Error::Toml(_)
            | Error::Regex(_) => ErrorCategory::Configuration,

            Error::PlatformMismatch { .. }
            | Error::IncompatiblePromptType { .. }
            | Error::DuplicatePromptType { .. }
            | Error::UnknownPromptType { .. }
            | Error::PromptPatternMissing { .. }
            | Error::SessionClosed { .. }
            | Error::PromptNotDetected { .. } => ErrorCategory::Compatibility,

            Error::MultiLineAutonomous | Error::UnsupportedPayload { .. } => {
                ErrorCategory::Unsupported
            }

            Error::PtyCreationFailed { .. }
            | Error::CommandSpawnFailed { .. }
            | Error::PtyReaderCloneFailed { .. }
            | Error::PtyWriterTakeFailed { .. }
            | Error::PtyInputSendFailed { .. } => ErrorCategory::Transport,

            Error::ForegroundExecutionFailed { .. }
            | Error::FrameworkFailed { .. }
            | Error::SignalSendFailed { .. }
            | Error::Io(_)
            | Error::Other(_) => ErrorCategory::Execution,
        }
    }

    /// Whether the console must stop after reporting this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Transport
        )
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
