//! Non-interactive subcommands
//!
//! `show` lists a tool's entries or details one of them, `build` prints the
//! final text of an entry, and `run` executes an entry that needs no session.
//! Entries are numbered from 1 in the tool's sorted order.

use crate::catalog::InputSource;
use crate::error::{Error, Result};
use crate::models::{Entry, ExecutionType, Tool};
use std::io::Write;

/// Entry `number` (1-based) of `tool`
pub fn entry_at(tool: &Tool, number: usize) -> Result<&Entry> {
    number
        .checked_sub(1)
        .and_then(|index| tool.entry(index))
        .ok_or_else(|| {
            Error::Other(format!(
                "{} has no entry {} (1-{})",
                tool.name,
                number,
                tool.entries.len()
            ))
        })
}

/// Numbered list of a tool's entries
pub fn render_tool(tool: &Tool, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{} ({})", tool.name, tool.platform)?;
    if !tool.description.is_empty() {
        writeln!(out, "  {}", tool.description)?;
    }
    if let Some(module) = &tool.ptf_module {
        writeln!(out, "  PTF module: {}", module)?;
    }
    writeln!(out)?;
    for (index, entry) in tool.entries.iter().enumerate() {
        writeln!(
            out,
            "{:>4}. {} [{}, {}, {}]",
            index + 1,
            entry.name(),
            entry.kind(),
            entry.info().execution_type,
            entry.info().prompt_type
        )?;
    }
    Ok(())
}

/// Full details of one entry, placeholders shown as `{TYPE}`
pub fn render_entry(entry: &Entry, out: &mut dyn Write) -> Result<()> {
    let info = entry.info();
    writeln!(out, "{} ({})", info.name, entry.kind())?;
    writeln!(out, "  prompt:    {}", info.prompt_type)?;
    writeln!(out, "  execution: {}", info.execution_type)?;
    for line in entry.preview().lines() {
        writeln!(out, "  > {}", line)?;
    }
    if let Entry::Command(command) = entry {
        for input in &command.inputs {
            if input.is_menu() {
                writeln!(
                    out,
                    "  input:     {} ({}: {})",
                    input.name,
                    input.kind,
                    input.options.join(", ")
                )?;
            } else {
                writeln!(out, "  input:     {} ({})", input.name, input.kind)?;
            }
        }
    }
    for output in &info.outputs {
        writeln!(out, "  output:    {}", output)?;
    }
    if !info.note.is_empty() {
        writeln!(out, "  note:      {}", info.note)?;
    }
    Ok(())
}

/// `show <tool> [n]`
pub fn show(tool: &Tool, number: Option<usize>, out: &mut dyn Write) -> Result<()> {
    match number {
        None => render_tool(tool, out),
        Some(number) => render_entry(entry_at(tool, number)?, out),
    }
}

/// `build <tool> <n>`
pub fn build(
    tool: &Tool,
    number: usize,
    inputs: &mut dyn InputSource,
    out: &mut dyn Write,
) -> Result<()> {
    let resolved = entry_at(tool, number)?.resolve(inputs)?;
    writeln!(out, "{}", resolved.payload)?;
    Ok(())
}

/// Whether `run` may execute the entry outside the console
///
/// Interactive entries need the console's sessions and are refused.
pub fn check_runnable(entry: &Entry) -> Result<()> {
    match entry.info().execution_type {
        ExecutionType::Standalone | ExecutionType::Autonomous | ExecutionType::Nx => Ok(()),
        ExecutionType::Interactive => Err(Error::UnsupportedPayload {
            command: entry.name().to_string(),
            reason: "interactive commands run from the console menu".to_string(),
        }),
    }
}
