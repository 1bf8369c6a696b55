//! Operator prompts.
//!
//! `Prompter` is the seam the menu loop talks to. `TerminalConsole` drives an
//! interactive terminal through `inquire`; `Console` reads plain lines from
//! any `BufRead`, which covers piped input and scripted sessions.

use inquire::{Confirm, InquireError, Text};
use std::io::{self, BufRead, Write};

/// Prompting surface used by the menu loop.
///
/// Every read returns `None` when the operator ends input (EOF, Esc or
/// Ctrl+C); the caller abandons the current step.
pub trait Prompter {
    /// Writes one line.
    fn say(&mut self, text: &str) -> io::Result<()>;

    /// Asks for one free-text answer.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>>;

    /// Asks with `current` offered as the answer; a blank reply keeps it.
    fn prompt_with_default(&mut self, label: &str, current: &str) -> io::Result<Option<String>>;

    /// `true` only for an affirmative answer.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Interactive terminal prompts backed by `inquire`.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalConsole {
    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(io::stdout(), "{text}")
    }

    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        answered(Text::new(label.trim_end()).prompt())
    }

    fn prompt_with_default(&mut self, label: &str, current: &str) -> io::Result<Option<String>> {
        let message = format!("{label}:");
        let answer = answered(
            Text::new(&message)
                .with_default(current)
                .with_help_message("Enter keeps the current value")
                .prompt(),
        )?;
        Ok(answer.map(|value| keep_blank_as(value, current)))
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = answered(Confirm::new(question).with_default(false).prompt())?;
        Ok(answer.unwrap_or(false))
    }
}

/// Maps an `inquire` outcome onto the `Prompter` contract.
fn answered<T>(result: Result<T, InquireError>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(InquireError::IO(err)) => Err(err),
        Err(err) => Err(io::Error::new(io::ErrorKind::Other, err.to_string())),
    }
}

fn keep_blank_as(value: String, current: &str) -> String {
    if value.trim().is_empty() {
        current.to_string()
    } else {
        value
    }
}

/// Line-oriented prompts over an input reader and an output writer.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for Console<R, W> {
    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Writes `label` without a newline and reads one line of input.
    ///
    /// Bytes that are not UTF-8 are replaced rather than rejected. The
    /// trailing line break is stripped; other whitespace is kept.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn prompt_with_default(&mut self, label: &str, current: &str) -> io::Result<Option<String>> {
        let answer = self.prompt(&format!("{label} [{current}]: "))?;
        Ok(answer.map(|value| keep_blank_as(value, current)))
    }

    /// Accepts `y` or `yes`, any case.
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.prompt(&format!("{question} (y/n): "))?;
        Ok(matches!(
            answer.as_deref().map(|value| value.trim().to_ascii_lowercase()).as_deref(),
            Some("y" | "yes")
        ))
    }
}
