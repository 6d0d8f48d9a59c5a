//! Command-text builder
//!
//! Command text marks operator input with typed placeholders such as
//! `{IPV4}`. A `Template` splits the text at those placeholders once, at load
//! time; building fills the slots in order.

use crate::error::{Error, Result};
use crate::models::{InputSpec, Payload};
use regex::Regex;

/// Supplies values for command inputs
pub trait InputSource {
    /// Value for one input; menu inputs pick from `input.options`
    fn read_value(&mut self, input: &InputSpec) -> Result<String>;
}

/// Piece of a template line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Index into the command's inputs
    Slot(usize),
}

/// Parsed command text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    lines: Vec<Vec<Segment>>,
    multi_line: bool,
    kinds: Vec<String>,
}

impl Template {
    /// Split text at `{TYPE}` placeholders, where TYPE is one of `input_types`
    pub fn parse(text: &Payload, input_types: &[String]) -> Result<Self> {
        let alternatives: Vec<String> = input_types
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(t))
            .collect();
        let placeholder = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"\{{({})\}}", alternatives.join("|")))?)
        };

        let mut kinds = Vec::new();
        let mut lines = Vec::new();

        for line in text.lines() {
            let mut segments = Vec::new();
            let mut last = 0;
            for caps in placeholder.iter().flat_map(|re| re.captures_iter(line)) {
                let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                if whole.start() > last {
                    segments.push(Segment::Literal(line[last..whole.start()].to_string()));
                }
                segments.push(Segment::Slot(kinds.len()));
                kinds.push(kind.as_str().to_string());
                last = whole.end();
            }
            if last < line.len() {
                segments.push(Segment::Literal(line[last..].to_string()));
            }
            lines.push(segments);
        }

        Ok(Self {
            lines,
            multi_line: text.is_multi_line(),
            kinds,
        })
    }

    /// Placeholder types in order of appearance
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    pub fn slot_count(&self) -> usize {
        self.kinds.len()
    }

    /// Text with every placeholder rendered as `{TYPE}`
    pub fn preview(&self) -> Payload {
        let kinds: Vec<String> = self.kinds.iter().map(|k| format!("{{{}}}", k)).collect();
        self.fill(&kinds)
    }

    /// Text with placeholders replaced by `values`, in order
    pub fn render(&self, values: &[String]) -> Result<Payload> {
        if values.len() != self.kinds.len() {
            return Err(Error::UnsupportedPayload {
                command: self.preview().to_string(),
                reason: format!("expected {} input values, got {}", self.kinds.len(), values.len()),
            });
        }
        Ok(self.fill(values))
    }

    fn fill(&self, values: &[String]) -> Payload {
        let mut rendered: Vec<String> = self
            .lines
            .iter()
            .map(|segments| {
                segments
                    .iter()
                    .map(|segment| match segment {
                        Segment::Literal(text) => text.as_str(),
                        Segment::Slot(index) => values[*index].as_str(),
                    })
                    .collect()
            })
            .collect();

        if self.multi_line {
            Payload::Lines(rendered)
        } else {
            Payload::Single(rendered.pop().unwrap_or_default())
        }
    }
}

/// Input source replaying fixed answers, for non-interactive builds
#[derive(Debug, Default)]
pub struct FixedInputs {
    values: std::collections::VecDeque<String>,
}

impl FixedInputs {
    pub fn new<I: IntoIterator<Item = String>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl InputSource for FixedInputs {
    fn read_value(&mut self, input: &InputSpec) -> Result<String> {
        self.values.pop_front().ok_or_else(|| Error::UnsupportedPayload {
            command: input.name.clone(),
            reason: "no value supplied".to_string(),
        })
    }
}
