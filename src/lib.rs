// Loading
mod lexer;
mod loader;
pub use loader::{Assembly, Line, Operand, Program};
mod symbol;
pub use symbol::{Labels, Mnemonic, MEMORY_SIZE};

// Checking
mod check;
pub use check::check;
mod error;
pub use error::Fault;

// Running
mod breakpoint;
pub use breakpoint::Breakpoints;
mod engine;
pub use engine::{Engine, HaltReason, Observer, Snapshot, State, StopHandle, DEFAULT_DELAY};
mod io;
pub use io::{InputSource, OutputSink, QueuedInput, TerminalInput};
#[macro_use]
pub mod output;
mod debugger;
pub use debugger::{Debugger, DebuggerOptions};

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
