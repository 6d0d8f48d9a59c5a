//! promptmux - operator console for command-line security tools
//!
//! Without a subcommand the interactive menu starts. `show`, `build` and
//! `run` work on one tool entry without entering the menu.

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, error, info};

use promptmux::app::{commands, Console, LineOperator, OperatorInputs};
use promptmux::catalog::{FixedInputs, InputSource};
use promptmux::config::LoadOptions;
use promptmux::platform::Platform;
use promptmux::{ConfigLoader, Outcome};

#[derive(Debug, Parser)]
#[command(name = "promptmux", version, about)]
struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output (-v for debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List a tool's entries, or details of entry N
    Show { tool: String, number: Option<usize> },

    /// Print the final text of entry N
    Build {
        tool: String,
        number: usize,
        /// Input values in order; asked for interactively when omitted
        #[arg(short, long = "input", value_name = "VALUE")]
        inputs: Vec<String>,
    },

    /// Execute entry N (standalone, autonomous and NX entries only)
    Run {
        tool: String,
        number: usize,
        /// Input values in order; asked for interactively when omitted
        #[arg(short, long = "input", value_name = "VALUE")]
        inputs: Vec<String>,
    },
}

fn init_logging(cli: &Cli) {
    let debug_env = env::var("PROMPTMUX_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose > 1 {
        "trace"
    } else if cli.verbose == 1 || debug_env {
        "debug"
    } else {
        "warn"
    };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Fixed values when given on the command line, else ask the operator
fn input_source<'a>(values: &[String], operator: &'a LineOperator) -> Box<dyn InputSource + 'a> {
    if values.is_empty() {
        Box::new(OperatorInputs::new(operator))
    } else {
        Box::new(FixedInputs::new(values.iter().cloned()))
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut loader = ConfigLoader::new();
    let config = loader
        .load_with_options(LoadOptions {
            explicit_path: cli.config.clone(),
            ..LoadOptions::default()
        })
        .context("Unable to load configuration")?;

    let operator = Arc::new(LineOperator::stdio());
    let mut console = Console::from_config(&config, operator.clone())
        .context("Unable to load tool catalog")?;

    let mut stdout = std::io::stdout();
    let result = match cli.command {
        None => console.run().await.map(|()| 0),
        Some(Commands::Show { tool, number }) => console
            .tool(&tool)
            .and_then(|tool| commands::show(tool, number, &mut stdout))
            .map(|()| 0),
        Some(Commands::Build {
            tool,
            number,
            inputs,
        }) => {
            let mut source = input_source(&inputs, &operator);
            console
                .tool(&tool)
                .and_then(|tool| commands::build(tool, number, source.as_mut(), &mut stdout))
                .map(|()| 0)
        }
        Some(Commands::Run {
            tool,
            number,
            inputs,
        }) => {
            let runnable = console
                .tool(&tool)
                .and_then(|found| commands::entry_at(found, number))
                .and_then(commands::check_runnable);
            match runnable {
                Ok(()) => {
                    let mut source = input_source(&inputs, &operator);
                    console
                        .execute(&tool, number, source.as_mut())
                        .await
                        .map(|outcome| match outcome {
                            Outcome::Executed {
                                exit_code: Some(code),
                            } => code,
                            Outcome::Executed { exit_code: None } => 1,
                            _ => 0,
                        })
                }
                Err(e) => Err(e),
            }
        }
    };

    console.shutdown(Platform::signals().as_ref()).await;
    Ok(result?)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    info!("Starting {} v{}", promptmux::NAME, promptmux::VERSION);
    debug!("Arguments: {:?}", cli);

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("ERROR: {:#}", e);
            process::exit(1);
        }
    }
}
