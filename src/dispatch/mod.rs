//! Task dispatch
//!
//! The [`Dispatcher`] owns every live session and routes interactive tasks to
//! them. Tasks are queued FIFO and the queue is drained one task per call to
//! [`Dispatcher::handle_next`]; [`Dispatcher::submit`] enqueues and drains in
//! one step. Every call produces exactly one completion: the returned
//! `Result<Outcome>`.
//!
//! Routing for a task starting in prompt type `S` and ending in `E`:
//! - a session presenting `S` exists: reuse it, unless the prompt type changes
//!   and another session already presents `E`
//! - no such session and `S` is bash: spawn a shell, unless a session already
//!   presents `E`
//! - otherwise the task cannot be serviced

pub mod registry;

pub use registry::SessionRegistry;

use crate::config::{PromptCatalog, TimeoutConfig, BASH_PROMPT};
use crate::error::{Error, ErrorCategory, Result};
use crate::models::{InteractiveTask, SessionHandle};
use crate::platform::SignalOps;
use crate::pty::SessionSpawner;
use crate::terminal::read_until_prompt;
use std::collections::VecDeque;
use std::io::Write;
use uuid::Uuid;

/// How a dispatch or execution call completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was queued
    Idle,
    /// A foreground subprocess ran to completion
    Executed { exit_code: Option<i32> },
    /// The command text was printed, not executed
    Printed,
    /// The text was sent to a session, which now presents `prompt_type`
    Transmitted { session: Uuid, prompt_type: String },
    /// Nothing to do for this command
    Skipped { reason: String },
    /// The operator declined to continue
    Declined,
}

/// Routes interactive tasks to live sessions
pub struct Dispatcher {
    registry: SessionRegistry,
    queue: VecDeque<InteractiveTask>,
    prompts: PromptCatalog,
    timeouts: TimeoutConfig,
    spawner: Box<dyn SessionSpawner>,
    out: Box<dyn Write + Send>,
    completions: u64,
}

impl Dispatcher {
    pub fn new(
        prompts: PromptCatalog,
        timeouts: TimeoutConfig,
        spawner: Box<dyn SessionSpawner>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            queue: VecDeque::new(),
            prompts,
            timeouts,
            spawner,
            out,
            completions: 0,
        }
    }

    pub fn prompts(&self) -> &PromptCatalog {
        &self.prompts
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Number of completed dispatch calls
    pub fn completions(&self) -> u64 {
        self.completions
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Whether a live session presents `prompt_type`
    pub fn has_session(&mut self, prompt_type: &str) -> bool {
        self.remove_closed_sessions();
        self.registry.contains(prompt_type)
    }

    pub fn enqueue(&mut self, task: InteractiveTask) {
        self.queue.push_back(task);
    }

    /// Enqueue a task and drain it
    pub async fn submit(&mut self, task: InteractiveTask) -> Result<Outcome> {
        self.enqueue(task);
        self.handle_next().await
    }

    /// Route the next queued task, if any
    pub async fn handle_next(&mut self) -> Result<Outcome> {
        let result = match self.queue.pop_front() {
            None => Ok(Outcome::Idle),
            Some(task) => {
                self.remove_closed_sessions();
                self.route(task).await
            }
        };

        self.completions += 1;
        if let Err(e) = &result {
            debug!("Dispatch completed with error: {}", e);
        }
        result
    }

    async fn route(&mut self, task: InteractiveTask) -> Result<Outcome> {
        if let Some(mut handle) = self.registry.take(task.starting_prompt()) {
            if task.prompt_change() && self.registry.contains(task.ending_prompt()) {
                warn!(
                    "Rejected task: a '{}' session already exists",
                    task.ending_prompt()
                );
                self.registry.insert(handle)?;
                return Err(Error::DuplicatePromptType {
                    prompt_type: task.ending_prompt().to_string(),
                });
            }

            let prior = handle.process_mut().drain();
            if !prior.is_empty() {
                if let Err(e) = self.out.write_all(prior.as_bytes()) {
                    self.registry.insert(handle)?;
                    return Err(e.into());
                }
            }

            info!(
                "Transmitting to session {} ('{}')",
                handle.id(),
                handle.prompt_type()
            );
            return self.transmit_and_register(handle, &task).await;
        }

        if task.starting_prompt() == BASH_PROMPT {
            if self.registry.contains(task.ending_prompt()) {
                warn!(
                    "Rejected task: a '{}' session already exists",
                    task.ending_prompt()
                );
                return Err(Error::DuplicatePromptType {
                    prompt_type: task.ending_prompt().to_string(),
                });
            }

            let process = self.spawner.spawn_shell().await?;
            let pattern = self.prompts.resolve(BASH_PROMPT)?.cloned();
            let handle = SessionHandle::new(process, BASH_PROMPT, pattern);
            info!(
                "Spawned session {} (pid {:?})",
                handle.id(),
                handle.process().pid()
            );
            return self.transmit_and_register(handle, &task).await;
        }

        warn!(
            "Rejected task: no session presents '{}'",
            task.starting_prompt()
        );
        Err(Error::IncompatiblePromptType {
            prompt_type: task.starting_prompt().to_string(),
        })
    }

    /// Transmit, then file the handle under the task's ending prompt type
    async fn transmit_and_register(
        &mut self,
        mut handle: SessionHandle,
        task: &InteractiveTask,
    ) -> Result<Outcome> {
        let result = self.transmit(&mut handle, task).await;

        match result {
            Ok(()) => {
                handle.retarget(
                    task.ending_prompt(),
                    Some(task.ending_prompt_pattern().clone()),
                );
                let outcome = Outcome::Transmitted {
                    session: handle.id(),
                    prompt_type: task.ending_prompt().to_string(),
                };
                self.registry.insert(handle)?;
                Ok(outcome)
            }
            Err(e)
                if e.category() == ErrorCategory::Transport
                    || matches!(e, Error::SessionClosed { .. }) =>
            {
                debug!("Dropping session {} after error", handle.id());
                Err(e)
            }
            Err(e) => {
                // The text was delivered; keep the session under the prompt it was sent toward
                handle.retarget(
                    task.ending_prompt(),
                    Some(task.ending_prompt_pattern().clone()),
                );
                self.registry.insert(handle)?;
                Err(e)
            }
        }
    }

    async fn transmit(&mut self, handle: &mut SessionHandle, task: &InteractiveTask) -> Result<()> {
        for line in task.text().lines() {
            handle.process_mut().send_line(line).await?;
        }

        read_until_prompt(
            handle.process_mut(),
            task.ending_prompt_pattern(),
            task.ending_prompt(),
            &self.timeouts,
            self.out.as_mut(),
        )
        .await
    }

    /// Drop sessions whose process has exited
    pub fn remove_closed_sessions(&mut self) {
        for prompt_type in self.registry.remove_closed() {
            info!("Session '{}' exited, removed from registry", prompt_type);
        }
    }

    /// Hang up every live session and clear the registry
    pub async fn shutdown(&mut self, signals: &dyn SignalOps) {
        self.queue.clear();
        for mut handle in self.registry.drain() {
            if !handle.process_mut().is_alive() {
                continue;
            }
            if let Some(pid) = handle.process().pid() {
                if !signals.is_process_running(pid) {
                    continue;
                }
                match signals.send_hangup(pid).await {
                    Ok(()) => debug!("Sent SIGHUP to session {} (pid {})", handle.id(), pid),
                    Err(e) => warn!("Failed to hang up session {}: {}", handle.id(), e),
                }
            }
        }
        if let Err(e) = self.out.flush() {
            debug!("Failed to flush output: {}", e);
        }
    }
}
