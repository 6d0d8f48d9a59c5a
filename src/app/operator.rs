//! Line-oriented operator prompts
//!
//! Questions are written to the output sink and answers read one line at a
//! time, so the same code drives a real terminal and scripted tests.

use crate::catalog::InputSource;
use crate::error::{Error, Result};
use crate::execution::Operator;
use crate::models::InputSpec;
use std::io::{BufRead, Write};
use std::sync::Mutex;

/// Operator answering on a line-based reader
pub struct LineOperator {
    input: Mutex<Box<dyn BufRead + Send>>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl LineOperator {
    pub fn new(input: Box<dyn BufRead + Send>, out: Box<dyn Write + Send>) -> Self {
        Self {
            input: Mutex::new(input),
            out: Mutex::new(out),
        }
    }

    /// Operator on the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(
            Box::new(std::io::BufReader::new(std::io::stdin())),
            Box::new(std::io::stdout()),
        )
    }

    fn write(&self, text: &str) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| Error::Other("output sink poisoned".to_string()))?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Next answer, trimmed; end of input is an `UnexpectedEof` I/O error
    fn read_answer(&self) -> Result<String> {
        let mut input = self
            .input
            .lock()
            .map_err(|_| Error::Other("input source poisoned".to_string()))?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "end of operator input",
            )));
        }
        Ok(line.trim().to_string())
    }
}

impl Operator for LineOperator {
    fn confirm(&self, question: &str) -> Result<bool> {
        loop {
            self.write(&format!("{} [Y/n] ", question))?;
            match self.read_answer()?.to_lowercase().as_str() {
                "" | "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.write("Please answer y or n.\n")?,
            }
        }
    }

    fn ask(&self, question: &str) -> Result<String> {
        self.write(&format!("{}: ", question))?;
        self.read_answer()
    }

    fn choose(&self, title: &str, options: &[String]) -> Result<Option<usize>> {
        let mut menu = format!("\n{}\n", title);
        for (index, option) in options.iter().enumerate() {
            menu.push_str(&format!("{:>4}. {}\n", index + 1, option));
        }
        self.write(&menu)?;

        loop {
            self.write("Select (number, empty to go back): ")?;
            let answer = self.read_answer()?;
            if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => self.write(&format!("Enter a number from 1 to {}.\n", options.len()))?,
            }
        }
    }
}

/// Adapts an [`Operator`] into an [`InputSource`] for building command text
pub struct OperatorInputs<'a> {
    operator: &'a dyn Operator,
}

impl<'a> OperatorInputs<'a> {
    pub fn new(operator: &'a dyn Operator) -> Self {
        Self { operator }
    }
}

impl InputSource for OperatorInputs<'_> {
    fn read_value(&mut self, input: &InputSpec) -> Result<String> {
        if input.is_menu() {
            let title = format!("{} ({})", input.name, input.kind);
            return self
                .operator
                .choose(&title, &input.options)?
                .and_then(|index| input.options.get(index).cloned())
                .ok_or_else(|| Error::UnsupportedPayload {
                    command: input.name.clone(),
                    reason: "no option selected".to_string(),
                });
        }

        loop {
            let value = self
                .operator
                .ask(&format!("{} ({})", input.name, input.kind))?;
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }
}
