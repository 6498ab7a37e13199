mod command;
mod error;
mod source;

use std::cell::Cell;
use std::rc::Rc;

use self::command::{Command, Location};
use self::source::{SourceMode, SourceReader};
use crate::engine::{Engine, Snapshot, State};
use crate::io::{InputSource, OutputSink};
use crate::loader::split_lines;
use crate::output::{Condition, Output};
use crate::symbol::Span;

/// Leave this as a struct, in case more options are added in the future. Plus it is more explicit.
#[derive(Debug, Default)]
pub struct DebuggerOptions {
    /// Commands to run instead of reading them from stdin
    pub command: Option<String>,
}

/// Drives an [`Engine`] from user commands.
pub struct Debugger<I, O> {
    engine: Engine<I, O>,
    src: String,
    command_source: SourceMode,

    /// Amount of instructions executed since last command.
    instruction_count: Rc<Cell<u32>>,
    /// Whether PC should be displayed on next command prompt.
    should_echo_pc: bool,
}

impl<I: InputSource, O: OutputSink> Debugger<I, O> {
    pub fn new(opts: DebuggerOptions, src: &str, input: I, output: O) -> Self {
        let mut engine = Engine::new(src, input, output);
        let instruction_count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&instruction_count);
        engine.attach(move |_: &Snapshot| counter.set(counter.get() + 1));

        Self {
            engine,
            src: src.to_string(),
            command_source: SourceMode::from(opts.command),
            instruction_count,
            should_echo_pc: true,
        }
    }

    /// Read and execute commands until `quit` or the commands run out.
    pub fn run(&mut self) {
        loop {
            Output::Debugger(Condition::Always).start_new_line();
            self.report_progress();

            // Treat EOF as `quit`
            let Some(line) = self.command_source.read().map(|line| line.trim().to_string()) else {
                break;
            };
            if line.is_empty() {
                continue;
            }

            let command = match Command::try_from(line.as_str()) {
                Ok(command) => command,
                Err(error) => {
                    dprintln!(Always, "{}", error);
                    dprintln!(Always, "Type `help` for a list of commands.");
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            self.execute(command);
        }
    }

    pub fn engine(&self) -> &Engine<I, O> {
        &self.engine
    }

    fn report_progress(&mut self) {
        let count = self.instruction_count.replace(0);
        if count > 0 {
            dprintln!(
                Always,
                "Executed {} instruction{}.",
                count,
                if count == 1 { "" } else { "s" },
            );
        }
        if self.should_echo_pc && !self.engine.is_halted() {
            dprintln!(
                Sometimes,
                "Program counter at line {}.",
                self.engine.program_counter() + 1
            );
        }
        self.should_echo_pc = false;
    }

    fn execute(&mut self, command: Command) {
        match command {
            // Handled by caller
            Command::Quit => (),

            Command::Help => {
                dprintln!(Always, "{}", include_str!("./help.txt"));
            }

            Command::Step { count } => {
                if !self.check_running() {
                    return;
                }
                for _ in 0..count {
                    self.engine.step_over();
                    if self.engine.is_halted() {
                        break;
                    }
                }
                self.after_execution(false);
            }

            Command::Continue => {
                if !self.check_running() {
                    return;
                }
                dprintln!(Sometimes, "Continuing...");
                self.engine.resume();
                self.after_execution(true);
            }

            Command::Registers => {
                dprintln!(Sometimes, "Registers:");
                Output::Debugger(Condition::Always).print_registers(&self.engine.snapshot());
            }

            Command::Memory => {
                dprintln!(Sometimes, "Memory:");
                Output::Debugger(Condition::Always).print_memory(&self.engine.snapshot());
            }

            Command::Labels => {
                let labels = self.engine.labels();
                if labels.is_empty() {
                    dprintln!(Always, "No labels exist.");
                    return;
                }
                dprintln!(Sometimes, "Labels:");
                for (name, index) in labels.iter() {
                    dprintln!(Always, "{:<12} line {}", name, index + 1);
                }
            }

            Command::Reset => {
                self.engine.reset();
                self.should_echo_pc = true;
                dprintln!(Always, "Reset program to initial state.");
            }

            Command::Source { location } => {
                if let Some(index) = self.resolve_location(location) {
                    self.show_line_context(index);
                }
            }

            Command::BreakAdd { location } => {
                let Some(index) = self.resolve_location(location) else {
                    return;
                };
                if self.engine.breakpoints_mut().insert(index) {
                    dprintln!(Always, "Added breakpoint at line {}.", index + 1);
                } else {
                    dprintln!(Always, "Breakpoint already exists at line {}.", index + 1);
                }
            }
            Command::BreakRemove { location } => {
                let Some(index) = self.resolve_location(location) else {
                    return;
                };
                if self.engine.breakpoints_mut().remove(index) {
                    dprintln!(Always, "Removed breakpoint at line {}.", index + 1);
                } else {
                    dprintln!(Always, "No breakpoint exists at line {}.", index + 1);
                }
            }
            Command::BreakList => {
                let breakpoints = self.engine.breakpoints();
                if breakpoints.is_empty() {
                    dprintln!(Always, "No breakpoints exist.");
                    return;
                }
                dprintln!(Always, "Breakpoints:");
                for (i, index) in breakpoints.iter().enumerate() {
                    if Output::is_minimal() {
                        dprintln!(Always, "{}", index + 1);
                        continue;
                    }
                    dprint!(
                        Always,
                        "{} line {:<3} ──  ",
                        if i + 1 == breakpoints.len() {
                            "╰─"
                        } else {
                            "├─"
                        },
                        index + 1
                    );
                    let line = self.engine.program().source_line(index).unwrap_or("");
                    dprintln!(Always, "{}", line.trim());
                }
            }
        }
    }

    /// Returns `false` if the program can't execute until it is reset.
    fn check_running(&self) -> bool {
        if self.engine.is_halted() {
            dprintln!(
                Always,
                "Program has halted. Use `reset` to run it again."
            );
            return false;
        }
        true
    }

    /// `resumed` is set when execution could have paused on a breakpoint.
    fn after_execution(&mut self, resumed: bool) {
        self.should_echo_pc = true;
        match self.engine.state() {
            State::Halted(_) => {
                Output::Normal.start_new_line();
                dprintln!(Always, "Program has halted.");
            }
            _ if self.engine.is_exhausted() => {
                dprintln!(Always, "Reached end of program. Pausing execution.");
            }
            State::Paused
                if resumed && self.engine.breakpoints().contains(self.engine.program_counter()) =>
            {
                dprintln!(Always, "Reached breakpoint. Pausing execution.");
            }
            _ => (),
        }
    }

    /// Line index for a location, defaulting to the line under the program counter.
    fn resolve_location(&self, location: Option<Location>) -> Option<usize> {
        let index = match location {
            None => self.engine.program_counter(),
            Some(Location::Line(line)) => line - 1,
            Some(Location::Label(name)) => {
                let Some(index) = self.engine.program().labels().get(name) else {
                    dprintln!(Always, "Label not found named `{}`.", name);
                    return None;
                };
                dprintln!(Sometimes, "Label `{}` is on line {}.", name, index + 1);
                index
            }
        };
        if index >= self.engine.program().len() {
            dprintln!(
                Always,
                "Line {} is past the end of the program.",
                index + 1
            );
            return None;
        }
        Some(index)
    }

    fn show_line_context(&self, index: usize) {
        let Some((offset, text)) = split_lines(&self.src).nth(index) else {
            return;
        };
        if Output::is_minimal() {
            dprintln!(Always, "{}", text.trim_end());
            return;
        }
        let span = Span::new(offset, text.trim_end().len());
        let report = miette::miette!(
            severity = miette::Severity::Advice,
            labels = vec![miette::LabeledSpan::at(
                span,
                format!("Line {}", index + 1),
            )],
            "",
        )
        .with_source_code(self.src.clone());
        eprintln!("{:?}", report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HaltReason;
    use crate::io::QueuedInput;

    fn debugger(src: &str, commands: &str) -> Debugger<QueuedInput, Vec<String>> {
        let opts = DebuggerOptions {
            command: Some(commands.to_string()),
        };
        Debugger::new(opts, src, QueuedInput::new(), Vec::new())
    }

    const COUNTDOWN: &str = "      LDA three\n\
                             loop: SUB one\n\
                             \x20     OUT\n\
                             \x20     BRP loop\n\
                             \x20     HLT\n\
                             three: DAT 3\n\
                             one:  DAT 1";

    #[test]
    fn steps_then_quits() {
        let mut debugger = debugger(COUNTDOWN, "step 2; registers; quit; continue");
        debugger.run();
        let engine = debugger.engine();
        assert_eq!(engine.program_counter(), 2);
        assert_eq!(engine.accumulator(), 2);
        assert_eq!(engine.state(), &State::Paused);
    }

    #[test]
    fn breakpoint_on_label() {
        let mut debugger = debugger(COUNTDOWN, "break add loop\ncontinue\ncontinue");
        debugger.run();
        let engine = debugger.engine();
        assert!(engine.breakpoints().contains(1));
        assert_eq!(engine.program_counter(), 1);
        assert_eq!(engine.accumulator(), 2);
        assert_eq!(engine.output(), &["Output: 2"]);
    }

    #[test]
    fn continue_to_halt_and_reset() {
        let mut debugger = debugger(COUNTDOWN, "continue; step; reset; step");
        debugger.run();
        let engine = debugger.engine();
        assert_eq!(
            engine.output(),
            &["Output: 2", "Output: 1", "Output: 0", "Output: -1", "Program Halted."]
        );
        assert_eq!(engine.program_counter(), 1);
        assert_eq!(engine.accumulator(), 3);
        assert_eq!(engine.halt_reason(), None::<&HaltReason>);
    }

    #[test]
    fn invalid_commands_are_skipped() {
        let mut debugger = debugger(COUNTDOWN, "jump 4; break add nowhere; break add 99; step");
        debugger.run();
        let engine = debugger.engine();
        assert!(engine.breakpoints().is_empty());
        assert_eq!(engine.program_counter(), 1);
    }

    #[test]
    fn step_onto_breakpoint_then_continue() {
        let mut debugger = debugger(COUNTDOWN, "break add 2; step; continue");
        debugger.run();
        let engine = debugger.engine();
        assert_eq!(engine.program_counter(), 1);
        assert_eq!(engine.accumulator(), 2);
        assert_eq!(engine.output(), &["Output: 2"]);
    }

    #[test]
    fn continue_past_last_line() {
        let mut debugger = debugger("OUT\nOUT", "continue; continue");
        debugger.run();
        let engine = debugger.engine();
        assert!(!engine.is_halted());
        assert_eq!(engine.output(), &["Output: 0", "Output: 0"]);
    }

    #[test]
    fn remove_breakpoint() {
        let mut debugger = debugger(COUNTDOWN, "break add 4; break remove 4; continue");
        debugger.run();
        assert!(debugger.engine().is_halted());
    }
}
