//! Unix filesystem operations

use crate::error::{Error, Result};
use crate::platform::traits::FilesystemOps;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub struct UnixFilesystem;

impl UnixFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl FilesystemOps for UnixFilesystem {
    fn is_executable(&self, path: &Path) -> bool {
        path.metadata()
            .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    fn find_command(&self, command: &str) -> Result<Option<PathBuf>> {
        let output = Command::new("which")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| Error::ForegroundExecutionFailed {
                command: format!("which \"{}\"", command),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Ok(None);
        }

        let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        Ok(self.is_executable(&path).then_some(path))
    }
}
