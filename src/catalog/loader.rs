//! Tool file loading
//!
//! The inventory folder holds one sub-folder per toolkit; each toolkit holds
//! YAML tool files. A tool file declares one tool for one platform:
//!
//! ```yaml
//! name: nmap
//! os: Linux
//! ptf_module: modules/vulnerability-analysis/nmap
//! description: Network exploration and security auditing
//! commands:
//!   - name: Quick scan
//!     prompt: bash
//!     execution: standalone
//!     text: nmap -F {IPV4}
//!     inputs:
//!       - Target host
//!     outputs: [STDOUT]
//! ```
//!
//! Several files may declare the same name and platform; their entries are
//! merged into one tool.

use super::builder::Template;
use super::Catalog;
use crate::config::{PromptCatalog, OTHER_PROMPT};
use crate::error::{Error, Result};
use crate::models::{
    Action, Command, Entry, EntryInfo, ExecutionType, InputSpec, OutputSpec, Payload, Tool,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct RawTool {
    name: String,
    os: String,
    #[serde(default)]
    ptf_module: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    commands: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    prompt: String,
    execution: ExecutionType,
    text: Payload,
    #[serde(default)]
    inputs: Vec<RawInput>,
    #[serde(default)]
    outputs: Vec<OutputSpec>,
    #[serde(default)]
    note: String,
}

/// An input label, or a label mapped to its menu options
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInput {
    Label(String),
    Menu(BTreeMap<String, Vec<String>>),
}

/// Loads every toolkit under an inventory folder
pub struct CatalogLoader<'a> {
    inventory: PathBuf,
    prompts: &'a PromptCatalog,
    input_types: &'a [String],
}

impl<'a> CatalogLoader<'a> {
    pub fn new(inventory: &Path, prompts: &'a PromptCatalog, input_types: &'a [String]) -> Self {
        Self {
            inventory: inventory.to_path_buf(),
            prompts,
            input_types,
        }
    }

    /// Load all toolkits
    ///
    /// A missing inventory folder yields an empty catalog; any unreadable or
    /// invalid tool file fails the whole load.
    pub fn load(&self) -> Result<Catalog> {
        let mut catalog = Catalog::default();

        if !self.inventory.is_dir() {
            warn!(
                "Inventory folder {} not found, catalog is empty",
                self.inventory.display()
            );
            return Ok(catalog);
        }

        for toolkit_dir in sorted_entries(&self.inventory)? {
            if !toolkit_dir.is_dir() {
                continue;
            }
            let toolkit = toolkit_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let files: Vec<PathBuf> = sorted_entries(&toolkit_dir)?
                .into_iter()
                .filter(|path| path.is_file() && is_tool_file(path))
                .collect();
            if files.is_empty() {
                continue;
            }

            debug!("Loading toolkit '{}' ({} files)", toolkit, files.len());
            for file in files {
                let tool = self.load_file(&file)?;
                catalog.add_tool(tool)?;
            }
            catalog.add_toolkit(toolkit);
        }

        catalog.finish();
        let stats = catalog.stats();
        info!(
            "Loaded {} commands from {} tools in {} toolkits",
            stats.commands, stats.tools, stats.toolkits
        );
        Ok(catalog)
    }

    /// Parse one tool file
    pub fn load_file(&self, path: &Path) -> Result<Tool> {
        let content = fs::read_to_string(path).map_err(|e| Error::CatalogLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let raw: RawTool = serde_yaml::from_str(&content).map_err(|e| Error::CatalogLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.build_tool(raw)
    }

    fn build_tool(&self, raw: RawTool) -> Result<Tool> {
        let label = format!("{} ({})", raw.name, raw.os);
        if raw.name.trim().is_empty() {
            return Err(Error::InvalidToolDefinition {
                tool: label,
                reason: "empty tool name".to_string(),
            });
        }

        let mut tool = Tool {
            name: raw.name,
            platform: raw.os,
            ptf_module: raw.ptf_module.filter(|module| !module.is_empty()),
            description: raw.description,
            entries: Vec::new(),
        };

        let mut entries = Vec::with_capacity(raw.commands.len());
        for entry in raw.commands {
            entries.push(self.build_entry(&label, entry)?);
        }
        tool.merge(entries)?;
        Ok(tool)
    }

    fn build_entry(&self, tool: &str, raw: RawEntry) -> Result<Entry> {
        let invalid = |reason: String| Error::InvalidToolDefinition {
            tool: tool.to_string(),
            reason,
        };

        if !self.prompts.contains(&raw.prompt) {
            return Err(invalid(format!(
                "'{}' uses unknown prompt type '{}'",
                raw.name, raw.prompt
            )));
        }
        for output in &raw.outputs {
            if let OutputSpec::Prompt(prompt) = output {
                if !self.prompts.contains(prompt) || prompt == OTHER_PROMPT {
                    return Err(invalid(format!(
                        "'{}' ends in unusable prompt type '{}'",
                        raw.name, prompt
                    )));
                }
            }
        }

        let info = EntryInfo {
            name: raw.name,
            prompt_type: raw.prompt,
            execution_type: raw.execution,
            outputs: raw.outputs,
            note: raw.note,
        };

        let template = Template::parse(&raw.text, self.input_types)?;
        if raw.inputs.is_empty() {
            if template.slot_count() > 0 {
                return Err(invalid(format!(
                    "'{}' has {} placeholders but no inputs",
                    info.name,
                    template.slot_count()
                )));
            }
            return Ok(Entry::Action(Action {
                info,
                text: raw.text,
            }));
        }

        if template.slot_count() != raw.inputs.len() {
            return Err(invalid(format!(
                "'{}' has {} placeholders for {} inputs",
                info.name,
                template.slot_count(),
                raw.inputs.len()
            )));
        }

        let mut inputs = Vec::with_capacity(raw.inputs.len());
        for (input, kind) in raw.inputs.into_iter().zip(template.kinds()) {
            let (name, options) = match input {
                RawInput::Label(name) => (name, Vec::new()),
                RawInput::Menu(map) => map.into_iter().next().ok_or_else(|| {
                    invalid(format!("'{}' has an empty menu input", info.name))
                })?,
            };
            if kind.ends_with("MENU") && options.is_empty() {
                return Err(invalid(format!(
                    "'{}' input '{}' is a {} without options",
                    info.name, name, kind
                )));
            }
            inputs.push(InputSpec {
                name,
                kind: kind.clone(),
                options,
            });
        }

        Ok(Entry::Command(Command {
            info,
            template,
            inputs,
        }))
    }
}

fn is_tool_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    )
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_failed = |e: std::io::Error| Error::CatalogLoadFailed {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_failed)? {
        paths.push(entry.map_err(read_failed)?.path());
    }
    paths.sort();
    Ok(paths)
}
