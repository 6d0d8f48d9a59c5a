//! Tool installation through the PenTesters Framework (PTF)
//!
//! A tool carrying a PTF module path is considered installed when the
//! module's install location exists under PTF's base install path. Tools
//! without a module fall back to a `PATH` lookup.

use crate::error::{Error, Result};
use crate::models::Tool;
use crate::platform::FilesystemOps;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Detects and installs tools
#[async_trait]
pub trait PackageFramework: Send + Sync {
    /// Whether the tool appears to be installed
    fn is_installed(&self, tool: &Tool) -> Result<bool>;

    /// Whether [`PackageFramework::install`] can be attempted for the tool
    fn can_install(&self, tool: &Tool) -> bool;

    /// Install the tool, returning whether the installer succeeded
    async fn install(&self, tool: &Tool) -> Result<bool>;
}

/// PTF checkout on disk
pub struct Ptf {
    folder: PathBuf,
    platform: String,
    filesystem: Box<dyn FilesystemOps>,
}

impl Ptf {
    pub fn new(folder: PathBuf, platform: &str, filesystem: Box<dyn FilesystemOps>) -> Self {
        Self {
            folder,
            platform: platform.to_string(),
            filesystem,
        }
    }

    /// Install directory PTF would use for `module`
    pub fn install_location(&self, module: &str) -> Result<PathBuf> {
        let config = self.folder.join("config").join("ptf.config");
        let base = read_assignment(&config, "BASE_INSTALL_PATH", module)?;

        let module_file = self.folder.join(format!("{}.py", module));
        let location = read_assignment(&module_file, "INSTALL_LOCATION", module)?;

        // modules/<category>/<name>: PTF installs into <base>/<category>/<location>
        let category = module.split('/').nth(1).ok_or_else(|| Error::FrameworkFailed {
            tool: module.to_string(),
            reason: "module path has no category".to_string(),
        })?;

        Ok(PathBuf::from(base).join(category).join(location))
    }
}

/// Quoted value of `KEY="value"` in a PTF configuration or module file
fn read_assignment(path: &Path, key: &str, module: &str) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FrameworkFailed {
        tool: module.to_string(),
        reason: format!("unable to read {}: {}", path.display(), e),
    })?;

    let prefix = format!("{}=", key);
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(&prefix))
        .find_map(|value| value.split('"').nth(1).map(str::to_string))
        .ok_or_else(|| Error::FrameworkFailed {
            tool: module.to_string(),
            reason: format!("{} not set in {}", key, path.display()),
        })
}

#[async_trait]
impl PackageFramework for Ptf {
    fn is_installed(&self, tool: &Tool) -> Result<bool> {
        match &tool.ptf_module {
            Some(module) => {
                let location = self.install_location(module)?;
                debug!("Checking PTF install location {}", location.display());
                Ok(location.exists())
            }
            None => Ok(self.filesystem.find_command(&tool.name)?.is_some()),
        }
    }

    fn can_install(&self, tool: &Tool) -> bool {
        tool.ptf_module.is_some()
    }

    async fn install(&self, tool: &Tool) -> Result<bool> {
        let module = tool.ptf_module.as_deref().ok_or_else(|| Error::FrameworkFailed {
            tool: tool.name.clone(),
            reason: "no PTF module declared".to_string(),
        })?;

        if !self.platform.eq_ignore_ascii_case("Linux") {
            return Err(Error::FrameworkFailed {
                tool: tool.name.clone(),
                reason: format!("unable to run PTF on {}", self.platform),
            });
        }

        let failed = |e: std::io::Error| Error::FrameworkFailed {
            tool: tool.name.clone(),
            reason: e.to_string(),
        };

        info!("Installing {} via PTF module {}", tool.name, module);
        let mut child = Command::new("python3")
            .arg("./ptf")
            .arg("--no-network-connection")
            .current_dir(&self.folder)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(failed)?;

        if let Some(mut stdin) = child.stdin.take() {
            let script = format!("use {}\ninstall\n", module);
            stdin.write_all(script.as_bytes()).await.map_err(failed)?;
        }

        let status = child.wait().await.map_err(failed)?;
        Ok(status.success())
    }
}
