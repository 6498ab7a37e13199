use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use lmc::output::{GridRenderer, Output, TerminalOutput};
use lmc::{Debugger, DebuggerOptions, Engine, HaltReason, TerminalInput, DEFAULT_DELAY};

/// lmc assembles, runs and debugs Little Man Computer programs.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.lmc` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program and print its output to the terminal
    Run {
        /// Program to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Run a program with the debugger
    Debug {
        /// Program to run
        name: PathBuf,
        /// Read debugger commands from argument
        #[arg(short, long)]
        command: Option<String>,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Run a program one step at a time, showing memory after each step
    Slow {
        /// Program to run
        name: PathBuf,
        /// Milliseconds to wait between steps
        #[arg(short, long)]
        delay: Option<u64>,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Check a program for errors without running it
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    lmc::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(lmc::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let Some(command) = args.command else {
        if let Some(path) = args.path {
            return run(&path, false);
        }
        println!("\n~ lmc v{VERSION} ~");
        println!("{}", "Little Man Computer".cyan().bold());
        println!("{SHORT_INFO}");
        return Ok(());
    };

    match command {
        Command::Run { name, minimal } => run(&name, minimal),
        Command::Debug {
            name,
            command,
            minimal,
        } => debug(&name, DebuggerOptions { command }, minimal),
        Command::Slow {
            name,
            delay,
            minimal,
        } => {
            let delay = delay
                .map(Duration::from_millis)
                .or_else(lmc::env::delay)
                .unwrap_or(DEFAULT_DELAY);
            slow(&name, delay, minimal)
        }
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            let src = read(&name)?;
            let errors = lmc::check(&src);
            if errors.is_empty() {
                message(Green, "Success", "no errors found!");
                return Ok(());
            }
            for error in &errors {
                eprintln!("{:?}", error);
            }
            bail!(
                "Found {} error{}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            )
        }
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    if Output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn read(name: &Path) -> Result<String> {
    if !name.exists() {
        bail!("File does not exist. Exiting...");
    }
    fs::read_to_string(name).into_diagnostic()
}

fn set_minimal(minimal: bool) -> bool {
    let minimal = minimal || lmc::env::is_minimal();
    Output::set_minimal(minimal);
    minimal
}

fn run(name: &Path, minimal: bool) -> Result<()> {
    let minimal = set_minimal(minimal);
    let src = read(name)?;

    file_message(MsgColor::Green, "Running", name);
    let mut engine = Engine::new(&src, TerminalInput::new(minimal), TerminalOutput);
    engine.run();

    finish(name, engine.halt_reason())
}

fn debug(name: &Path, opts: DebuggerOptions, minimal: bool) -> Result<()> {
    let minimal = set_minimal(minimal);
    let src = read(name)?;

    file_message(MsgColor::Green, "Debugging", name);
    message(MsgColor::Cyan, "Help", "type `help` for a list of commands");
    let mut debugger = Debugger::new(opts, &src, TerminalInput::new(minimal), TerminalOutput);
    debugger.run();

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

fn slow(name: &Path, delay: Duration, minimal: bool) -> Result<()> {
    let minimal = set_minimal(minimal);
    let src = read(name)?;

    file_message(MsgColor::Green, "Running", name);
    message(
        MsgColor::Cyan,
        "Delay",
        &format!("{} ms between steps", delay.as_millis()),
    );
    let mut engine = Engine::new(&src, TerminalInput::new(minimal), TerminalOutput);
    engine.attach(GridRenderer::new());
    engine.run_slow(delay);

    finish(name, engine.halt_reason())
}

/// Fail if the program halted on an error.
fn finish(name: &Path, reason: Option<&HaltReason>) -> Result<()> {
    if let Some(HaltReason::Fault(_)) = reason {
        file_message(MsgColor::Red, "Failed", name);
        bail!("Program halted on an error");
    }
    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

const SHORT_INFO: &str = r"
Welcome to lmc, a toolchain for Little Man Computer assembly.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
