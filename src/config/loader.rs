//! Configuration File Loading
//!
//! Finds `promptmux.{yaml,yml,toml,json}` along the search paths, parses it
//! according to its extension and validates the result.

use super::prompt::PromptCatalog;
use super::{Config, BASH_PROMPT};
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Base name of configuration files
const CONFIG_FILE_STEM: &str = "promptmux";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files
    search_paths: Vec<PathBuf>,
    /// Supported configuration file formats
    supported_formats: Vec<ConfigFormat>,
    /// Current configuration file path (if loaded)
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// YAML format (`.yaml` or `.yml`)
    Yaml,
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Format for a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Some(ConfigFormat::Yaml),
            Some("toml") => Some(ConfigFormat::Toml),
            Some("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            ConfigFormat::Yaml => &["yaml", "yml"],
            ConfigFormat::Toml => &["toml"],
            ConfigFormat::Json => &["json"],
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// File given on the command line; searched paths are ignored when set
    pub explicit_path: Option<PathBuf>,
    /// Whether to fall back to the default config if none exists
    pub create_default: bool,
    /// Whether to validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            explicit_path: None,
            create_default: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            supported_formats: vec![ConfigFormat::Yaml, ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Load configuration with default options
    pub fn load() -> Result<Config> {
        Self::new().load_with_options(LoadOptions::default())
    }

    /// Load configuration with custom options
    pub fn load_with_options(&mut self, options: LoadOptions) -> Result<Config> {
        let found = match &options.explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigLoadFailed {
                        path: path.clone(),
                        reason: "file does not exist".to_string(),
                    });
                }
                let format = ConfigFormat::from_path(path).ok_or_else(|| Error::ConfigLoadFailed {
                    path: path.clone(),
                    reason: "unsupported file extension".to_string(),
                })?;
                Some((path.clone(), self.load_config_file(path, format)?))
            }
            None => self.find_and_load_config()?,
        };

        let config = match found {
            Some((path, config)) => {
                info!("Loaded configuration from {}", path.display());
                self.current_path = Some(path);
                config
            }
            None if options.create_default => {
                debug!("No configuration file found, using defaults");
                Config::default()
            }
            None => return Err(Error::ConfigNotFound),
        };

        if options.validate {
            validate_config(&config)?;
        }

        Ok(config)
    }

    /// Find and load configuration from search paths
    ///
    /// The first existing file wins; a file that exists but fails to parse is
    /// an error rather than a reason to keep searching.
    fn find_and_load_config(&self) -> Result<Option<(PathBuf, Config)>> {
        for dir in &self.search_paths {
            for format in &self.supported_formats {
                for extension in format.extensions() {
                    let config_path = dir.join(format!("{}.{}", CONFIG_FILE_STEM, extension));
                    if config_path.exists() {
                        let config = self.load_config_file(&config_path, *format)?;
                        return Ok(Some((config_path, config)));
                    }
                }
            }
        }

        Ok(None)
    }

    /// Load a specific configuration file
    fn load_config_file(&self, path: &Path, format: ConfigFormat) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let parse_error = |reason: String| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason,
        };

        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string())),
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
            ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Get default search paths for configuration files
    fn get_search_paths() -> Vec<PathBuf> {
        use crate::platform::Platform;

        let mut paths = Vec::new();

        // Current working directory
        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd);
        }

        // Use platform abstraction for config directory
        if let Ok(config_dir) = Platform::paths().config_dir() {
            paths.push(config_dir.join(CONFIG_FILE_STEM));
        }

        // Home directory fallback
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", CONFIG_FILE_STEM)));
        }

        paths
    }

    /// Get the current configuration file path
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Add a custom search path
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Prompt patterns compile, names are unique, only "other" lacks a pattern
    PromptCatalog::from_config(&config.prompts)?;

    if !config.prompts.iter().any(|p| p.name == BASH_PROMPT) {
        return Err(Error::ConfigValidationFailed {
            field: "prompts".to_string(),
            reason: format!("The '{}' prompt type must be declared", BASH_PROMPT),
        });
    }

    // Timeout validation
    let read_timeout = config.timeouts.read_timeout_secs;
    if !read_timeout.is_finite() || read_timeout <= 0.0 {
        return Err(Error::ConfigValidationFailed {
            field: "timeouts.read_timeout_secs".to_string(),
            reason: "Read timeout must be a finite number greater than 0".to_string(),
        });
    }

    if config.timeouts.safety_cycles == 0 {
        return Err(Error::ConfigValidationFailed {
            field: "timeouts.safety_cycles".to_string(),
            reason: "Safety cycles must be greater than 0".to_string(),
        });
    }

    if config.timeouts.prompt_ceiling_cycles == Some(0) {
        return Err(Error::ConfigValidationFailed {
            field: "timeouts.prompt_ceiling_cycles".to_string(),
            reason: "Prompt ceiling must be greater than 0 when set".to_string(),
        });
    }

    // Session validation
    if config.session.shell.as_os_str().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "session.shell".to_string(),
            reason: "Shell path cannot be empty".to_string(),
        });
    }

    if config.session.rows == 0 || config.session.cols == 0 {
        return Err(Error::ConfigValidationFailed {
            field: "session.rows".to_string(),
            reason: "Terminal dimensions must be greater than 0".to_string(),
        });
    }

    // Input type validation
    for input_type in &config.input_types {
        if input_type.is_empty() || !input_type.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::ConfigValidationFailed {
                field: "input_types".to_string(),
                reason: format!("Invalid input type '{}'", input_type),
            });
        }
    }

    Ok(())
}
