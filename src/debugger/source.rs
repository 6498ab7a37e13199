use std::io::{self, IsTerminal, Read, Write};

/// Where debugger commands come from.
#[allow(private_interfaces)]
#[derive(Debug)]
pub enum SourceMode {
    Argument(Argument),
    Stdin(Stdin),
    Terminal(Terminal),
}

// Command-line argument
#[derive(Debug)]
struct Argument {
    buffer: String,
    /// Byte index
    cursor: usize,
}

// Stdin which is not attached to a terminal, i.e. piped.
#[derive(Debug)]
struct Stdin {
    stdin: io::Stdin,
    /// Command must be stored somewhere to be referenced
    buffer: String,
}

// Interactive terminal, one line of `;`-separated commands at a time
#[derive(Debug)]
struct Terminal {
    term: console::Term,
    buffer: String,
    /// Byte index
    cursor: usize,
}

pub trait SourceReader {
    /// `None` indicates EOF
    /// Returned string slice MAY include leading or trailing whitespace
    fn read(&mut self) -> Option<&str>;
}

impl SourceMode {
    pub fn from(argument: Option<String>) -> Self {
        if let Some(argument) = argument {
            return SourceMode::Argument(Argument::from(argument));
        }
        let stdin = io::stdin();
        if stdin.is_terminal() {
            return SourceMode::Terminal(Terminal::new());
        }
        SourceMode::Stdin(Stdin::from(stdin))
    }
}

impl SourceReader for SourceMode {
    fn read(&mut self) -> Option<&str> {
        let command = match self {
            Self::Argument(argument) => argument.read(),
            Self::Stdin(stdin) => stdin.read(),
            Self::Terminal(terminal) => return terminal.read(),
        };
        // Echo command for non-terminal source, in place of the prompt
        if let Some(command) = command {
            dprintln!(Sometimes, "\x1b[1mCommand:\x1b[0m {}", command.trim());
        }
        command
    }
}

impl Argument {
    pub fn from(source: String) -> Self {
        Self {
            buffer: source,
            cursor: 0,
        }
    }
}

impl SourceReader for Argument {
    fn read(&mut self) -> Option<&str> {
        // EOF
        if self.cursor >= self.buffer.len() {
            return None;
        }

        // Take characters until delimiter
        let start = self.cursor;
        let rest = &self.buffer[start..];
        let end = rest
            .find(['\n', ';'])
            .map_or(self.buffer.len(), |index| start + index);
        self.cursor = end + 1; // sizeof('\n' or ';')

        self.buffer.get(start..end)
    }
}

impl Stdin {
    pub fn from(stdin: io::Stdin) -> Self {
        Self {
            stdin,
            buffer: String::new(),
        }
    }

    /// `None` indicates EOF, or an unreadable stream
    fn read_char(&mut self) -> Option<char> {
        let mut buffer = [0; 1];
        match self.stdin.read(&mut buffer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(buffer[0] as char),
        }
    }
}

impl SourceReader for Stdin {
    fn read(&mut self) -> Option<&str> {
        self.buffer.clear();

        // Take characters until delimiter
        loop {
            let Some(ch) = self.read_char() else {
                if self.buffer.is_empty() {
                    return None; // First character is EOF
                }
                break;
            };
            if ch == '\n' || ch == ';' {
                break;
            }
            self.buffer.push(ch);
        }

        Some(&self.buffer)
    }
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            term: console::Term::stderr(),
            buffer: String::new(),
            cursor: 0,
        }
    }

    /// Read entire (multi-command) line from terminal. Returns `false` on EOF.
    fn read_line(&mut self) -> bool {
        let _ = write!(self.term, "\x1b[1;34mCommand: \x1b[0m");
        let _ = self.term.flush();
        match self.term.read_line() {
            Ok(line) => {
                self.buffer = line;
                true
            }
            Err(_) => false,
        }
    }

    /// Returns next command from line buffer
    fn next_command(&mut self) -> &str {
        let rest = &self.buffer[self.cursor..];
        match rest.find(';') {
            // Multiple commands in buffer
            // Take first command and update head index
            Some(index) => {
                self.cursor += index + 1;
                &rest[..index]
            }
            // Rest of buffer is 1 command
            // Take rest of buffer and reset head index
            None => {
                self.cursor = 0;
                rest
            }
        }
    }
}

impl SourceReader for Terminal {
    fn read(&mut self) -> Option<&str> {
        // Reached end of line buffer: read new line
        if self.cursor == 0 && !self.read_line() {
            return None;
        }
        Some(self.next_command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_splits_on_delimiters() {
        let mut argument = Argument::from("step 2;registers\n\nbreak add 3".to_string());
        assert_eq!(argument.read(), Some("step 2"));
        assert_eq!(argument.read(), Some("registers"));
        assert_eq!(argument.read(), Some(""));
        assert_eq!(argument.read(), Some("break add 3"));
        assert_eq!(argument.read(), None);
    }

    #[test]
    fn argument_trailing_delimiter() {
        let mut argument = Argument::from("quit;".to_string());
        assert_eq!(argument.read(), Some("quit"));
        assert_eq!(argument.read(), None);
    }
}
