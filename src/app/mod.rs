//! Operator console
//!
//! The [`Console`] owns the catalog, the dispatcher and the executor. Its menu
//! loop lets the operator pick a tool and one of its entries, fills in the
//! entry's inputs and hands the result to the executor. Sessions spawned along
//! the way stay alive between selections until [`Console::shutdown`].
//!
//! ## Module Organization
//!
//! - `mod.rs` - Console construction and the menu loop
//! - `commands.rs` - `show`, `build` and `run` subcommands
//! - `operator.rs` - Line-based operator prompts

pub mod commands;
pub mod operator;

pub use operator::{LineOperator, OperatorInputs};

use crate::catalog::{Catalog, CatalogLoader, InputSource};
use crate::config::{Config, PromptCatalog};
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::{Error, Result};
use crate::execution::{Executor, Operator, Ptf, SubprocessRunner};
use crate::models::Tool;
use crate::platform::{runtime_platform, Platform, SignalOps};
use crate::pty::PtySpawner;
use std::io::Write;
use std::sync::Arc;

pub struct Console {
    catalog: Catalog,
    dispatcher: Dispatcher,
    executor: Executor,
    operator: Arc<dyn Operator>,
    out: Box<dyn Write + Send>,
    platform: String,
}

impl Console {
    pub fn new(
        catalog: Catalog,
        dispatcher: Dispatcher,
        executor: Executor,
        operator: Arc<dyn Operator>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        let platform = executor.platform().to_string();
        Self {
            catalog,
            dispatcher,
            executor,
            operator,
            out,
            platform,
        }
    }

    /// Console wired to real sessions, subprocesses and stdout
    pub fn from_config(config: &Config, operator: Arc<dyn Operator>) -> Result<Self> {
        let prompts = PromptCatalog::from_config(&config.prompts)?;
        let catalog =
            CatalogLoader::new(&config.folders.inventory, &prompts, &config.input_types).load()?;

        let platform = runtime_platform();
        let dispatcher = Dispatcher::new(
            prompts,
            config.timeouts.clone(),
            Box::new(PtySpawner::new(config.session.clone())),
            Box::new(std::io::stdout()),
        );
        let executor = Executor::new(
            platform,
            Box::new(Ptf::new(
                config.folders.ptf.clone(),
                platform,
                Platform::filesystem(),
            )),
            operator.clone(),
            Box::new(SubprocessRunner::new(config.session.shell.clone())),
            Box::new(std::io::stdout()),
        );

        Ok(Self::new(
            catalog,
            dispatcher,
            executor,
            operator,
            Box::new(std::io::stdout()),
        ))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn operator(&self) -> &dyn Operator {
        self.operator.as_ref()
    }

    /// Tool named `name`, disambiguated by platform or by the operator
    pub fn tool(&self, name: &str) -> Result<&Tool> {
        self.catalog
            .resolve_tool(name, &self.platform, self.operator.as_ref())?
            .ok_or_else(|| Error::Other(format!("No tool named '{}'", name)))
    }

    pub fn print_stats(&mut self) -> Result<()> {
        let stats = self.catalog.stats();
        writeln!(
            self.out,
            "Loaded {} commands from {} tools in {} toolkits",
            stats.commands, stats.tools, stats.toolkits
        )?;
        Ok(())
    }

    /// Resolve entry `number` (1-based) of tool `name` and execute it
    pub async fn execute(
        &mut self,
        name: &str,
        number: usize,
        inputs: &mut dyn InputSource,
    ) -> Result<Outcome> {
        let tool = self
            .catalog
            .resolve_tool(name, &self.platform, self.operator.as_ref())?
            .ok_or_else(|| Error::Other(format!("No tool named '{}'", name)))?;
        let command = commands::entry_at(tool, number)?.resolve(inputs)?;
        self.executor
            .run(&mut self.dispatcher, tool, &command)
            .await
    }

    /// Menu loop; returns when the operator quits or a fatal error occurs
    pub async fn run(&mut self) -> Result<()> {
        self.print_stats()?;

        loop {
            let names: Vec<String> = self
                .catalog
                .tool_names()
                .into_iter()
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                writeln!(self.out, "No tools in the catalog.")?;
                return Ok(());
            }

            let choice = match self.operator.choose("Select tool", &names) {
                Ok(choice) => choice,
                Err(e) if is_end_of_input(&e) => return Ok(()),
                Err(e) => return Err(e),
            };
            let Some(index) = choice else {
                return Ok(());
            };
            let Some(name) = names.get(index) else {
                warn!("Tool selection {} out of range", index);
                return Ok(());
            };

            match self.tool_menu(name).await {
                Ok(()) => {}
                Err(e) if is_end_of_input(&e) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Entry menu for one tool, until the operator goes back
    async fn tool_menu(&mut self, name: &str) -> Result<()> {
        loop {
            let tool = match self
                .catalog
                .resolve_tool(name, &self.platform, self.operator.as_ref())?
            {
                Some(tool) => tool,
                None => return Ok(()),
            };

            let options: Vec<String> = tool
                .entries
                .iter()
                .map(|entry| format!("{} [{}]", entry.name(), entry.info().execution_type))
                .collect();
            let title = format!("Select command ({} on {})", tool.name, tool.platform);
            let Some(index) = self.operator.choose(&title, &options)? else {
                return Ok(());
            };
            let Some(entry) = tool.entry(index) else {
                continue;
            };

            commands::render_entry(entry, self.out.as_mut())?;
            if !self.operator.confirm("Execute?")? {
                continue;
            }

            let mut inputs = OperatorInputs::new(self.operator.as_ref());
            let result = match entry.resolve(&mut inputs) {
                Ok(command) => {
                    self.executor
                        .run(&mut self.dispatcher, tool, &command)
                        .await
                }
                Err(e) => Err(e),
            };
            self.report(result)?;
        }
    }

    /// Print the outcome of one execution; fatal errors are returned
    fn report(&mut self, result: Result<Outcome>) -> Result<()> {
        match result {
            Ok(Outcome::Executed {
                exit_code: Some(code),
            }) if code != 0 => {
                writeln!(self.out, "Exited with status {}", code)?;
            }
            Ok(Outcome::Skipped { reason }) => writeln!(self.out, "Skipped: {}", reason)?,
            Ok(outcome) => debug!("Command completed: {:?}", outcome),
            Err(e) if e.is_fatal() || is_end_of_input(&e) => return Err(e),
            Err(e) => {
                warn!("Command failed ({:?}): {}", e.category(), e);
                writeln!(self.out, "ERROR: {}", e)?;
            }
        }
        Ok(())
    }

    /// Hang up every session
    pub async fn shutdown(&mut self, signals: &dyn SignalOps) {
        self.dispatcher.shutdown(signals).await;
        if let Err(e) = self.out.flush() {
            debug!("Failed to flush console output: {}", e);
        }
    }
}

/// The operator's input stream ended
pub fn is_end_of_input(error: &Error) -> bool {
    matches!(error, Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}
