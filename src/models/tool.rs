//! Tool Model
//!
//! A cataloged command-line tool and its entries. An entry is either an
//! `Action`, whose text is final, or a `Command`, whose text carries typed
//! placeholders filled in by the operator before execution.

use crate::catalog::builder::{InputSource, Template};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a resolved command is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionType {
    /// Foreground subprocess, or a session turn when a session exists
    #[serde(rename = "standalone")]
    Standalone,
    /// Like standalone, single lines run through `sh -c`
    #[serde(rename = "autonomous")]
    Autonomous,
    /// Always a session turn ending in the declared PROMPT output
    #[serde(rename = "interactive")]
    Interactive,
    /// Printed only, never executed
    #[serde(rename = "NX", alias = "nx")]
    Nx,
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionType::Standalone => "standalone",
            ExecutionType::Autonomous => "autonomous",
            ExecutionType::Interactive => "interactive",
            ExecutionType::Nx => "NX",
        };
        f.write_str(name)
    }
}

/// Command text: one line or an ordered sequence of lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Single(String),
    Lines(Vec<String>),
}

impl Payload {
    /// Lines in transmission order
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Payload::Single(line) => vec![line.as_str()],
            Payload::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_multi_line(&self) -> bool {
        matches!(self, Payload::Lines(_))
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Declared output of an entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawOutput")]
pub enum OutputSpec {
    Stdout,
    Stderr,
    /// The prompt type the program presents when it finishes
    Prompt(String),
    /// File named by the n-th input (1-based)
    FileFromInput(usize),
    /// File with a fixed name
    FileNamed(String),
    /// Files named by the n-th input plus each extension
    FilePrefix { input: usize, extensions: Vec<String> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOutput {
    Stream(String),
    Prompt {
        #[serde(rename = "PROMPT")]
        prompt: String,
    },
    File {
        #[serde(rename = "FILE")]
        file: RawFileOutput,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFileOutput {
    Input { input: usize },
    Named { string: String },
    Prefix { prefix: usize, extensions: Vec<String> },
}

impl TryFrom<RawOutput> for OutputSpec {
    type Error = String;

    fn try_from(raw: RawOutput) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawOutput::Stream(name) => match name.as_str() {
                "STDOUT" => Ok(OutputSpec::Stdout),
                "STDERR" => Ok(OutputSpec::Stderr),
                other => Err(format!("unknown output type '{}'", other)),
            },
            RawOutput::Prompt { prompt } => Ok(OutputSpec::Prompt(prompt)),
            RawOutput::File { file } => Ok(match file {
                RawFileOutput::Input { input } => OutputSpec::FileFromInput(input),
                RawFileOutput::Named { string } => OutputSpec::FileNamed(string),
                RawFileOutput::Prefix { prefix, extensions } => OutputSpec::FilePrefix {
                    input: prefix,
                    extensions,
                },
            }),
        }
    }
}

impl fmt::Display for OutputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSpec::Stdout => write!(f, "STDOUT"),
            OutputSpec::Stderr => write!(f, "STDERR"),
            OutputSpec::Prompt(prompt) => write!(f, "PROMPT ({})", prompt),
            OutputSpec::FileFromInput(n) => write!(f, "FILE (input {})", n),
            OutputSpec::FileNamed(name) => write!(f, "FILE ({})", name),
            OutputSpec::FilePrefix { input, extensions } => {
                write!(f, "FILE (input {} + .{})", input, extensions.join(", ."))
            }
        }
    }
}

/// An operator-supplied value a command needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    /// Label shown when asking for the value
    pub name: String,
    /// Placeholder type, e.g. `IPV4`
    pub kind: String,
    /// Fixed choices for menu inputs
    pub options: Vec<String>,
}

impl InputSpec {
    pub fn is_menu(&self) -> bool {
        !self.options.is_empty()
    }
}

/// Fields shared by actions and commands
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub name: String,
    pub prompt_type: String,
    pub execution_type: ExecutionType,
    pub outputs: Vec<OutputSpec>,
    pub note: String,
}

/// Entry whose text needs no input
#[derive(Debug, Clone)]
pub struct Action {
    pub info: EntryInfo,
    pub text: Payload,
}

/// Entry whose text carries placeholders
#[derive(Debug, Clone)]
pub struct Command {
    pub info: EntryInfo,
    pub template: Template,
    pub inputs: Vec<InputSpec>,
}

/// A runnable catalog entry
#[derive(Debug, Clone)]
pub enum Entry {
    Action(Action),
    Command(Command),
}

impl Entry {
    pub fn info(&self) -> &EntryInfo {
        match self {
            Entry::Action(action) => &action.info,
            Entry::Command(command) => &command.info,
        }
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    /// "action" or "command"
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Action(_) => "action",
            Entry::Command(_) => "command",
        }
    }

    /// Text with placeholders shown as `{TYPE}`
    pub fn preview(&self) -> Payload {
        match self {
            Entry::Action(action) => action.text.clone(),
            Entry::Command(command) => command.template.preview(),
        }
    }

    /// Final text, asking the input source for every placeholder value
    pub fn resolve(&self, source: &mut dyn InputSource) -> Result<ResolvedCommand> {
        let payload = match self {
            Entry::Action(action) => action.text.clone(),
            Entry::Command(command) => {
                let mut values = Vec::with_capacity(command.inputs.len());
                for input in &command.inputs {
                    values.push(source.read_value(input)?);
                }
                command.template.render(&values)?
            }
        };

        let info = self.info();
        Ok(ResolvedCommand {
            name: info.name.clone(),
            prompt_type: info.prompt_type.clone(),
            execution_type: info.execution_type,
            payload,
            outputs: info.outputs.clone(),
            note: info.note.clone(),
        })
    }
}

/// An entry with its final text
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCommand {
    pub name: String,
    pub prompt_type: String,
    pub execution_type: ExecutionType,
    pub payload: Payload,
    pub outputs: Vec<OutputSpec>,
    pub note: String,
}

impl ResolvedCommand {
    /// First PROMPT-tagged output, the prompt an interactive command ends in
    pub fn ending_prompt(&self) -> Option<&str> {
        self.outputs.iter().find_map(|output| match output {
            OutputSpec::Prompt(prompt) => Some(prompt.as_str()),
            _ => None,
        })
    }
}

/// A cataloged tool for one platform
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    /// Platform name as declared, e.g. "Linux"
    pub platform: String,
    /// PenTesters Framework module path, e.g. `modules/exploitation/metasploit`
    pub ptf_module: Option<String>,
    pub description: String,
    /// Sorted case-insensitively by name
    pub entries: Vec<Entry>,
}

impl Tool {
    /// Case-insensitive platform comparison
    pub fn platform_matches(&self, runtime_platform: &str) -> bool {
        self.platform.eq_ignore_ascii_case(runtime_platform)
    }

    /// Entry by zero-based position in the sorted list
    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn find_entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Sort entries case-insensitively by name
    pub fn sort_entries(&mut self) {
        self.entries
            .sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));
    }

    /// Add entries from another file declaring the same tool
    pub fn merge(&mut self, entries: Vec<Entry>) -> Result<()> {
        for entry in entries {
            if self.find_entry(entry.name()).is_some() {
                return Err(Error::InvalidToolDefinition {
                    tool: format!("{} ({})", self.name, self.platform),
                    reason: format!("non-unique {} name \"{}\"", entry.kind(), entry.name()),
                });
            }
            self.entries.push(entry);
        }
        self.sort_entries();
        Ok(())
    }
}
