use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::breakpoint::Breakpoints;
use crate::error::Fault;
use crate::io::{InputSource, OutputSink};
use crate::loader::{Line, Operand, Program};
use crate::symbol::{Labels, Mnemonic, MEMORY_SIZE};

/// Delay between two steps in slow mode, unless the caller picks another.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

const HALT_MESSAGE: &str = "Program Halted.";
const CANCEL_MESSAGE: &str = "Program terminated by user (INP cancelled).";
const STOP_MESSAGE: &str = "Program stopped by user.";

/// Executes an assembled program one instruction at a time.
///
/// The program is loaded when the engine is constructed. `INP` reads from `I`, while `OUT` and
/// every status or error message are written to `O`.
pub struct Engine<I, O> {
    program: Program,
    /// Set if loading failed. Survives `reset`.
    load_fault: Option<Fault>,

    memory: [i64; MEMORY_SIZE],
    /// Accumulator
    acc: i64,
    /// Program counter, an index into the source lines
    pc: usize,
    state: State,

    input: I,
    output: O,
    observers: Vec<Box<dyn Observer>>,

    breakpoints: Breakpoints,
    /// Used to allow breakpoint to be passed on second attempt.
    current_breakpoint: Option<usize>,
    control: StopHandle,
}

/// Lifecycle of an engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// Constructed or reset; nothing executed yet.
    Ready,
    Running,
    /// Stopped between two steps and resumable.
    Paused,
    /// Terminal. Only `reset` leaves this state.
    Halted(HaltReason),
}

/// Why the machine halted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// Reached `HLT`.
    Finished,
    Fault(Fault),
    /// The `INP` prompt was cancelled.
    Cancelled,
    /// Force-halted by the controller.
    Stopped,
}

/// Copy of the machine state, pushed to observers after each step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub memory: [i64; MEMORY_SIZE],
    pub program_counter: usize,
    pub accumulator: i64,
}

/// Receives a snapshot after every executed step.
pub trait Observer {
    fn notify(&mut self, snapshot: &Snapshot);
}

impl<F: FnMut(&Snapshot)> Observer for F {
    fn notify(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// Shareable handle to stop or pause a running engine from outside the step loop.
///
/// Checked before every step, so a request takes effect between two instructions.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<(Mutex<Requests>, Condvar)>);

#[derive(Debug, Default)]
struct Requests {
    stop: bool,
    pause: bool,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force-halt the engine before its next step.
    pub fn stop(&self) {
        self.requests().stop = true;
        self.0 .1.notify_all();
    }

    /// Pause `run`, `resume` or slow mode before the next step.
    pub fn pause(&self) {
        self.requests().pause = true;
        self.0 .1.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.requests().stop
    }

    fn take_pause(&self) -> bool {
        std::mem::take(&mut self.requests().pause)
    }

    fn clear(&self) {
        *self.requests() = Requests::default();
    }

    /// Sleep for `delay`, waking early on a stop or pause request.
    fn wait(&self, delay: Duration) {
        let (_, condvar) = &*self.0;
        let deadline = Instant::now() + delay;
        let mut requests = self.requests();
        while !requests.stop && !requests.pause {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            (requests, _) = condvar
                .wait_timeout(requests, remaining)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn requests(&self) -> MutexGuard<'_, Requests> {
        self.0 .0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// What to do with the program counter after an instruction.
enum Flow {
    Next,
    Jump(usize),
    Halt(HaltReason),
}

impl<I: InputSource, O: OutputSink> Engine<I, O> {
    /// Load `src` and prepare to execute from line 0.
    ///
    /// A load error is written to `output` and leaves the engine halted.
    pub fn new(src: &str, input: I, mut output: O) -> Self {
        let assembly = Program::assemble(src);
        let state = match &assembly.fault {
            Some(fault) => {
                output.write_line(&fault.to_string());
                State::Halted(HaltReason::Fault(fault.clone()))
            }
            None => State::Ready,
        };
        Self {
            memory: *assembly.program.memory(),
            program: assembly.program,
            load_fault: assembly.fault,
            acc: 0,
            pc: 0,
            state,
            input,
            output,
            observers: Vec::new(),
            breakpoints: Breakpoints::new(),
            current_breakpoint: None,
            control: StopHandle::new(),
        }
    }

    pub fn attach(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Execute a single instruction.
    ///
    /// Never fails: errors halt the machine and are reported on the output sink.
    pub fn step(&mut self) {
        if self.poll_stop() {
            return;
        }
        if !matches!(self.state, State::Paused) {
            self.state = State::Running;
        }

        match self.execute() {
            Ok(Flow::Next) => self.pc += 1,
            Ok(Flow::Jump(target)) => self.pc = target,
            Ok(Flow::Halt(reason)) => self.state = State::Halted(reason),
            Err(fault) => {
                self.output.write_line(&fault.to_string());
                self.state = State::Halted(HaltReason::Fault(fault));
            }
        }
        self.notify();
    }

    fn execute(&mut self) -> Result<Flow, Fault> {
        let pc = self.pc;
        let line_number = pc + 1;
        let (mnemonic, operand) = match self.program.line(pc) {
            None => return Err(Fault::PcOutOfBounds { pc }),
            Some(Line::Blank | Line::LabelOnly) => return Ok(Flow::Next),
            Some(Line::Statement {
                name,
                mnemonic,
                operand,
            }) => {
                let Some(mnemonic) = mnemonic else {
                    return Err(Fault::UnknownInstruction {
                        line: line_number,
                        name: name.to_ascii_uppercase(),
                    });
                };
                let operand = match operand {
                    None => None,
                    Some(Operand::Literal(value)) => Some(*value),
                    Some(Operand::Symbol(symbol)) => match self.program.labels().get(symbol) {
                        Some(address) => Some(address as i64),
                        None => {
                            return Err(Fault::UndefinedLabel {
                                line: line_number,
                                operand: symbol.clone(),
                            })
                        }
                    },
                };
                (*mnemonic, operand)
            }
        };
        let address = operand.unwrap_or(0);

        match mnemonic {
            Mnemonic::Inp => {
                let Some(text) = self.input.read_integer() else {
                    self.output.write_line(CANCEL_MESSAGE);
                    return Ok(Flow::Halt(HaltReason::Cancelled));
                };
                let value = text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| Fault::InvalidInput { input: text })?;
                self.acc = value;
                self.output.write_line(&format!("Input: {value}"));
            }
            Mnemonic::Out => self.output.write_line(&format!("Output: {}", self.acc)),
            Mnemonic::Lda => self.acc = self.memory[cell(address, line_number)?],
            Mnemonic::Sta => self.memory[cell(address, line_number)?] = self.acc,
            Mnemonic::Add => {
                self.acc = self.acc.wrapping_add(self.memory[cell(address, line_number)?])
            }
            Mnemonic::Sub => {
                self.acc = self.acc.wrapping_sub(self.memory[cell(address, line_number)?])
            }
            Mnemonic::Bra => return jump(address, line_number),
            Mnemonic::Brz if self.acc == 0 => return jump(address, line_number),
            // Zero counts as positive
            Mnemonic::Brp if self.acc >= 0 => return jump(address, line_number),
            Mnemonic::Brz | Mnemonic::Brp => (),
            Mnemonic::Hlt => {
                self.output.write_line(HALT_MESSAGE);
                return Ok(Flow::Halt(HaltReason::Finished));
            }
            // Placed in memory by the loader
            Mnemonic::Dat => (),
        }
        Ok(Flow::Next)
    }

    /// Run until the machine halts, runs out of lines, or pauses on a breakpoint or pause request.
    ///
    /// Running out of lines is not an error here: the machine is left paused, not halted.
    pub fn run(&mut self) {
        self.resume();
    }

    /// Continue from a paused state until the machine halts, pauses again or runs out of lines.
    pub fn resume(&mut self) {
        if self.is_halted() {
            return;
        }
        self.state = State::Running;
        while !self.should_suspend() {
            if self.is_exhausted() {
                self.state = State::Paused;
                break;
            }
            self.step();
        }
    }

    /// Execute exactly one step, leaving the machine paused.
    pub fn step_over(&mut self) {
        if self.is_halted() {
            return;
        }
        self.state = State::Paused;
        self.step();
        // Resuming from here passes the breakpoint
        if self.breakpoints.contains(self.pc) {
            self.current_breakpoint = Some(self.pc);
        }
    }

    /// Whether the program counter is past the last source line.
    pub fn is_exhausted(&self) -> bool {
        self.pc >= self.program.len()
    }

    /// Pause between steps. Has no effect on a halted machine.
    pub fn pause(&mut self) {
        if !self.is_halted() {
            self.state = State::Paused;
        }
    }

    /// Step repeatedly, waiting `delay` after each step.
    ///
    /// Returns once halted, paused, or stopped through a [`StopHandle`].
    pub fn run_slow(&mut self, delay: Duration) {
        if self.is_halted() {
            return;
        }
        self.state = State::Running;
        while !self.should_suspend() {
            self.step();
            if self.is_halted() {
                break;
            }
            self.control.wait(delay);
        }
    }

    /// Force-halt the machine.
    pub fn stop(&mut self) {
        self.control.stop();
        self.poll_stop();
    }

    /// Handle which stops or pauses this engine from an observer or another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    /// Restore the state right after loading.
    pub fn reset(&mut self) {
        self.memory = *self.program.memory();
        self.acc = 0;
        self.pc = 0;
        self.current_breakpoint = None;
        self.control.clear();
        self.state = match &self.load_fault {
            Some(fault) => State::Halted(HaltReason::Fault(fault.clone())),
            None => State::Ready,
        };
    }

    /// Check the conditions under which a run loop must hand back control.
    fn should_suspend(&mut self) -> bool {
        if self.poll_stop() {
            return true;
        }
        if self.control.take_pause() || self.at_breakpoint() {
            self.state = State::Paused;
            return true;
        }
        false
    }

    /// Apply a pending stop request. Returns whether the machine is halted.
    fn poll_stop(&mut self) -> bool {
        if self.control.is_stopped() && !self.is_halted() {
            self.output.write_line(STOP_MESSAGE);
            self.state = State::Halted(HaltReason::Stopped);
        }
        self.is_halted()
    }

    /// Remember if previous run paused on the same breakpoint. If so, don't break now.
    fn at_breakpoint(&mut self) -> bool {
        if self.breakpoints.contains(self.pc) && self.current_breakpoint != Some(self.pc) {
            self.current_breakpoint = Some(self.pc);
            true
        } else {
            self.current_breakpoint = None;
            false
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.notify(&snapshot);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            memory: self.memory,
            program_counter: self.pc,
            accumulator: self.acc,
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, State::Halted(_))
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn halt_reason(&self) -> Option<&HaltReason> {
        match &self.state {
            State::Halted(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn memory(&self) -> [i64; MEMORY_SIZE] {
        self.memory
    }

    pub fn accumulator(&self) -> i64 {
        self.acc
    }

    pub fn program_counter(&self) -> usize {
        self.pc
    }

    pub fn labels(&self) -> Labels {
        self.program.labels().clone()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Decoded source lines, indexed like memory.
    pub fn lines(&self) -> &[Line] {
        self.program.lines()
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn breakpoints_mut(&mut self) -> &mut Breakpoints {
        &mut self.breakpoints
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }
}

/// Validate a data address.
fn cell(address: i64, line: usize) -> Result<usize, Fault> {
    usize::try_from(address)
        .ok()
        .filter(|index| *index < MEMORY_SIZE)
        .ok_or(Fault::MemoryOutOfBounds { line, address })
}

fn jump(address: i64, line: usize) -> Result<Flow, Fault> {
    usize::try_from(address)
        .map(Flow::Jump)
        .map_err(|_| Fault::BranchOutOfBounds { line, address })
}
