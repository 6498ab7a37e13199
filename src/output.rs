use std::cell::RefCell;
use std::io::{self, Write as _};
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::engine::{Observer, Snapshot};
use crate::io::OutputSink;
use crate::symbol::MEMORY_SIZE;

#[macro_export]
macro_rules! dprint {
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            $fmt
            $($tt)*
        );
        $crate::output::Output::Debugger($cond).print_str(&s);
    }};
}

#[macro_export]
macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Debugger($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Debugger($cond).print_str(&s);
    }};
}

/// Where a piece of text goes: program output to stdout, debugger text to stderr.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    Normal,
    Debugger(Condition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Printed even with `--minimal`, without colour
    Always,
    /// Decoration, dropped with `--minimal`
    Sometimes,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_LINE_START: RefCell<bool> = const { RefCell::new(true) };
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_line_start(new_value: bool) -> bool {
        Self::IS_LINE_START.with(|value| value.replace(new_value))
    }
    /// Private. Use [`Output::start_new_line`].
    fn is_line_start() -> bool {
        Self::IS_LINE_START.with(|value| *value.borrow())
    }
    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    fn set_line_start_from_str(string: &str) {
        let last = Decolored::new(string).last();
        if let Some(ch) = last {
            Output::set_line_start(ch == '\n');
        }
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                print!("{}", string);
                let _ = io::stdout().flush();
                Self::set_line_start_from_str(string);
            }

            Self::Debugger(condition) => match (Self::is_minimal(), *condition) {
                (false, _) => {
                    eprint!("{}", ColoredString::from(string).blue());
                    Self::set_line_start_from_str(string);
                }
                // Always remove color if `--minimal`
                (true, Condition::Always) => {
                    eprint_colorless(string);
                    Self::set_line_start_from_str(string);
                }
                (true, Condition::Sometimes) => (),
            },
        }
    }

    pub fn start_new_line(&self) {
        if !Self::is_line_start() {
            self.print_str("\n");
        }
    }

    /// Accumulator and program counter.
    pub fn print_registers(&self, snapshot: &Snapshot) {
        if Self::is_minimal() {
            self.print_str(&format!("ACC {}\n", snapshot.accumulator));
            self.print_str(&format!("PC {}\n", snapshot.program_counter));
            return;
        }

        self.print_str("\x1b[2m┌──────────────────────────┐\x1b[0m\n");
        self.print_str(&format!(
            "\x1b[2m│\x1b[0m \x1b[1mACC\x1b[0m {:>8}   \x1b[1mPC\x1b[0m {:>6} \x1b[2m│\x1b[0m\n",
            snapshot.accumulator, snapshot.program_counter
        ));
        self.print_str("\x1b[2m└──────────────────────────┘\x1b[0m\n");
    }

    /// Memory as a 10x10 grid, highlighting the cell under the program counter.
    pub fn print_memory(&self, snapshot: &Snapshot) {
        if Self::is_minimal() {
            for row in snapshot.memory.chunks(10) {
                let row: Vec<String> = row.iter().map(i64::to_string).collect();
                self.print_str(&format!("{}\n", row.join(" ")));
            }
            return;
        }

        self.print_str("\x1b[2m     ");
        for column in 0..10 {
            self.print_str(&format!("{:>6}", column));
        }
        self.print_str("\x1b[0m\n");
        for (address, value) in snapshot.memory.iter().enumerate() {
            if address % 10 == 0 {
                self.print_str(&format!("\x1b[2m{:>3}\x1b[0m  ", address));
            }
            let cell = format!("{:>6}", format!("{:03}", value));
            if address == snapshot.program_counter {
                self.print_str(&format!("\x1b[1;7m{}\x1b[0m", cell));
            } else if *value == 0 {
                self.print_str(&format!("\x1b[2m{}\x1b[0m", cell));
            } else {
                self.print_str(&cell);
            }
            if address % 10 == 9 {
                self.print_str("\n");
            }
        }
        debug_assert_eq!(snapshot.memory.len(), MEMORY_SIZE);
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl Iterator for Decolored<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    let string: String = Decolored::new(string).collect();
    eprint!("{}", string);
}

/// Writes program output and status lines to stdout.
#[derive(Debug, Default)]
pub struct TerminalOutput;

impl OutputSink for TerminalOutput {
    fn write_line(&mut self, line: &str) {
        Output::Normal.start_new_line();
        Output::Normal.print_str(&format!("{line}\n"));
    }
}

/// Draws the machine after every step, for slow mode.
#[derive(Debug, Default)]
pub struct GridRenderer {
    steps: usize,
}

impl GridRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer for GridRenderer {
    fn notify(&mut self, snapshot: &Snapshot) {
        self.steps += 1;
        let output = Output::Debugger(Condition::Always);
        output.start_new_line();
        dprintln!(Sometimes, "\n\x1b[1mStep {}\x1b[0m", self.steps);
        output.print_memory(snapshot);
        output.print_registers(snapshot);
    }
}
