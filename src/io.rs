use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

use console::Term;

/// Supplier of values for the `INP` instruction.
pub trait InputSource {
    /// Prompt for one integer.
    ///
    /// Returns the raw text entered, or `None` if the prompt was cancelled.
    fn read_integer(&mut self) -> Option<String>;
}

/// Append-only line writer for program output and status messages.
pub trait OutputSink {
    fn write_line(&mut self, line: &str);
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn read_integer(&mut self) -> Option<String> {
        (**self).read_integer()
    }
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn read_integer(&mut self) -> Option<String> {
        (**self).read_integer()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line)
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line)
    }
}

impl OutputSink for Vec<String> {
    fn write_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Scripted input. Running out of values counts as cancelling the prompt.
#[derive(Clone, Debug, Default)]
pub struct QueuedInput(VecDeque<String>);

impl QueuedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.0.push_back(value.into());
    }

    pub fn remaining(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<S> for QueuedInput {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        QueuedInput(iter.into_iter().map(Into::into).collect())
    }
}

impl InputSource for QueuedInput {
    fn read_integer(&mut self) -> Option<String> {
        self.0.pop_front()
    }
}

/// Reads `INP` values from the terminal, or line by line from piped stdin.
///
/// End of input cancels the prompt.
#[derive(Debug)]
pub struct TerminalInput {
    /// Suppress the prompt text
    minimal: bool,
}

impl TerminalInput {
    pub fn new(minimal: bool) -> Self {
        Self { minimal }
    }

    fn read_terminal(&self) -> Option<String> {
        let mut term = Term::stdout();
        if !self.minimal {
            write!(term, "Enter an integer for INP: ").ok()?;
            term.flush().ok()?;
        }
        // Interrupted reads and EOF cancel the prompt
        term.read_line().ok()
    }

    fn read_piped(&self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl InputSource for TerminalInput {
    fn read_integer(&mut self) -> Option<String> {
        if io::stdin().is_terminal() {
            self.read_terminal()
        } else {
            self.read_piped()
        }
    }
}
