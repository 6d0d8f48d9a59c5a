//! Unix path operations

use crate::error::{Error, Result};
use crate::platform::traits::PathOps;
use std::path::PathBuf;

pub struct UnixPaths;

impl UnixPaths {
    pub fn new() -> Self {
        Self
    }

    fn xdg_or(var: &str, fallback: Option<PathBuf>, home_relative: &[&str]) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(var) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = fallback {
            return Ok(dir);
        }
        dirs::home_dir()
            .map(|home| home_relative.iter().fold(home, |path, part| path.join(part)))
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Could not determine directory for {}", var),
                ))
            })
    }
}

impl PathOps for UnixPaths {
    fn config_dir(&self) -> Result<PathBuf> {
        Self::xdg_or("XDG_CONFIG_HOME", dirs::config_dir(), &[".config"])
    }

    fn data_dir(&self) -> Result<PathBuf> {
        Self::xdg_or("XDG_DATA_HOME", dirs::data_dir(), &[".local", "share"])
    }
}
