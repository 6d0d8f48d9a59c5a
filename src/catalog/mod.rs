//! Tool catalog
//!
//! All tools loaded from the inventory, sorted by name, plus the toolkits
//! they came from.

pub mod builder;
pub mod loader;

pub use builder::{FixedInputs, InputSource, Template};
pub use loader::CatalogLoader;

use crate::error::Result;
use crate::execution::Operator;
use crate::models::Tool;

/// Counts printed at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub commands: usize,
    pub tools: usize,
    pub toolkits: usize,
}

#[derive(Debug, Default)]
pub struct Catalog {
    tools: Vec<Tool>,
    toolkits: Vec<String>,
}

impl Catalog {
    /// Add a tool, merging it into an existing one with the same name and platform
    pub fn add_tool(&mut self, tool: Tool) -> Result<()> {
        let existing = self
            .tools
            .iter_mut()
            .find(|t| t.name == tool.name && t.platform_matches(&tool.platform));
        match existing {
            Some(existing) => {
                debug!("Merging additional entries into {} ({})", tool.name, tool.platform);
                if existing.ptf_module.is_none() {
                    existing.ptf_module = tool.ptf_module;
                }
                if existing.description.is_empty() {
                    existing.description = tool.description;
                }
                existing.merge(tool.entries)
            }
            None => {
                self.tools.push(tool);
                Ok(())
            }
        }
    }

    pub fn add_toolkit(&mut self, toolkit: String) {
        if !self.toolkits.contains(&toolkit) {
            self.toolkits.push(toolkit);
        }
    }

    /// Sort tools by name, then platform
    pub fn finish(&mut self) {
        self.tools.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.platform.cmp(&b.platform))
        });
        self.toolkits.sort();
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn toolkits(&self) -> &[String] {
        &self.toolkits
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Every platform variant of a tool, matched case-insensitively
    pub fn find_tools(&self, name: &str) -> Vec<&Tool> {
        self.tools
            .iter()
            .filter(|tool| tool.name.eq_ignore_ascii_case(name))
            .collect()
    }

    /// Distinct tool names in catalog order
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for tool in &self.tools {
            if names.last() != Some(&tool.name.as_str()) {
                names.push(&tool.name);
            }
        }
        names
    }

    /// The tool `name` refers to on `platform`
    ///
    /// A single match is returned as-is. With several platform variants the
    /// one matching `platform` wins; otherwise the operator picks one.
    pub fn resolve_tool(
        &self,
        name: &str,
        platform: &str,
        operator: &dyn Operator,
    ) -> Result<Option<&Tool>> {
        let candidates = self.find_tools(name);
        match candidates.len() {
            0 => Ok(None),
            1 => Ok(Some(candidates[0])),
            _ => {
                if let Some(tool) = candidates.iter().find(|t| t.platform_matches(platform)) {
                    return Ok(Some(*tool));
                }
                let options: Vec<String> = candidates
                    .iter()
                    .map(|t| format!("{} ({})", t.name, t.platform))
                    .collect();
                let choice = operator.choose(&format!("Which {}?", name), &options)?;
                Ok(choice.and_then(|index| candidates.get(index).copied()))
            }
        }
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            commands: self.tools.iter().map(|tool| tool.entries.len()).sum(),
            tools: self.tool_names().len(),
            toolkits: self.toolkits.len(),
        }
    }
}
