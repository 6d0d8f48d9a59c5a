//! Execution-type routing
//!
//! Decides how a resolved catalog command runs: as a blocking foreground
//! subprocess, printed only, or handed to the [`Dispatcher`] as an
//! interactive task.

pub mod framework;
pub mod runner;

pub use framework::{PackageFramework, Ptf};
pub use runner::{ForegroundRunner, SubprocessRunner};

use crate::config::{BASH_PROMPT, OTHER_PROMPT};
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::{Error, Result};
use crate::models::{ExecutionType, InteractiveTask, Payload, ResolvedCommand, Tool};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Questions put to the person at the console
pub trait Operator: Send + Sync {
    /// Yes/no question; an empty answer counts as yes
    fn confirm(&self, question: &str) -> Result<bool>;

    /// Free-form answer
    fn ask(&self, question: &str) -> Result<String>;

    /// Pick one of `options`, or `None` to cancel
    fn choose(&self, title: &str, options: &[String]) -> Result<Option<usize>>;
}

/// Routes resolved commands by execution type
pub struct Executor {
    platform: String,
    framework: Box<dyn PackageFramework>,
    operator: Arc<dyn Operator>,
    runner: Box<dyn ForegroundRunner>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Executor {
    pub fn new(
        platform: &str,
        framework: Box<dyn PackageFramework>,
        operator: Arc<dyn Operator>,
        runner: Box<dyn ForegroundRunner>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            framework,
            operator,
            runner,
            out: Mutex::new(out),
        }
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Run one resolved command of `tool`
    pub async fn run(
        &self,
        dispatcher: &mut Dispatcher,
        tool: &Tool,
        command: &ResolvedCommand,
    ) -> Result<Outcome> {
        let prompt_type = command.prompt_type.as_str();
        debug!(
            "Routing '{}' ({}, prompt '{}')",
            command.name, command.execution_type, prompt_type
        );

        if prompt_type == BASH_PROMPT {
            if !tool.platform_matches(&self.platform) {
                return Err(Error::PlatformMismatch {
                    tool: tool.name.clone(),
                    tool_platform: tool.platform.clone(),
                    runtime_platform: self.platform.clone(),
                });
            }
            if !self.ensure_installed(tool).await? {
                info!("Operator declined to run '{}'", command.name);
                return Ok(Outcome::Declined);
            }
        } else if prompt_type != OTHER_PROMPT && !dispatcher.has_session(prompt_type) {
            return Err(Error::IncompatiblePromptType {
                prompt_type: prompt_type.to_string(),
            });
        }

        match command.execution_type {
            ExecutionType::Standalone | ExecutionType::Autonomous => {
                let autonomous = command.execution_type == ExecutionType::Autonomous;
                if autonomous && command.payload.is_multi_line() {
                    return Err(Error::MultiLineAutonomous);
                }

                if prompt_type == BASH_PROMPT && !dispatcher.has_session(BASH_PROMPT) {
                    let exit_code = self.run_foreground(command, autonomous).await?;
                    return Ok(Outcome::Executed { exit_code });
                }

                let task = InteractiveTask::new(
                    command.payload.clone(),
                    prompt_type,
                    prompt_type,
                    dispatcher.prompts(),
                )?;
                dispatcher.submit(task).await
            }
            ExecutionType::Interactive => match command.ending_prompt() {
                None => {
                    warn!("'{}' declares no ending prompt, nothing to do", command.name);
                    Ok(Outcome::Skipped {
                        reason: format!("'{}' declares no PROMPT output", command.name),
                    })
                }
                Some(ending) => {
                    let task = InteractiveTask::new(
                        command.payload.clone(),
                        prompt_type,
                        ending,
                        dispatcher.prompts(),
                    )?;
                    dispatcher.submit(task).await
                }
            },
            ExecutionType::Nx => {
                self.print(&command.payload)?;
                Ok(Outcome::Printed)
            }
        }
    }

    /// False when the operator declines to continue
    async fn ensure_installed(&self, tool: &Tool) -> Result<bool> {
        if self.framework.is_installed(tool)? {
            return Ok(true);
        }

        let mut installed = false;
        if self.framework.can_install(tool)
            && self
                .operator
                .confirm(&format!("Install {} via PTF?", tool.name))?
        {
            match self.framework.install(tool).await {
                Ok(true) => installed = self.framework.is_installed(tool)?,
                Ok(false) => warn!("PTF reported a failed install of {}", tool.name),
                Err(e) => {
                    error!("Installing {} failed: {}", tool.name, e);
                    self.report(&e)?;
                }
            }
        }

        if installed {
            return Ok(true);
        }
        self.operator.confirm(&format!(
            "Unable to confirm {} is installed. Proceed anyway?",
            tool.name
        ))
    }

    async fn run_foreground(&self, command: &ResolvedCommand, autonomous: bool) -> Result<Option<i32>> {
        self.with_out(|out| writeln!(out))?;

        match &command.payload {
            Payload::Lines(lines) => self.runner.run_lines(lines).await,
            Payload::Single(line) if autonomous => self.runner.run_shell(line).await,
            Payload::Single(line) => {
                let argv = shell_words::split(line).map_err(|e| Error::UnsupportedPayload {
                    command: command.name.clone(),
                    reason: e.to_string(),
                })?;
                if argv.is_empty() {
                    return Err(Error::UnsupportedPayload {
                        command: command.name.clone(),
                        reason: "empty command".to_string(),
                    });
                }
                self.runner.run_argv(&argv).await
            }
        }
    }

    fn print(&self, payload: &Payload) -> Result<()> {
        self.with_out(|out| {
            writeln!(out)?;
            for line in payload.lines() {
                writeln!(out, "{}", line)?;
            }
            out.flush()
        })
    }

    fn report(&self, error: &Error) -> Result<()> {
        self.with_out(|out| writeln!(out, "ERROR: {}", error))
    }

    fn with_out<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
    {
        let mut out = self
            .out
            .lock()
            .map_err(|_| Error::Other("output sink poisoned".to_string()))?;
        f(&mut **out)?;
        Ok(())
    }
}
