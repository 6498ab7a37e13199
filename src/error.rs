use miette::{miette, Diagnostic, LabeledSpan, Report, Severity};
use thiserror::Error;

use crate::symbol::{Mnemonic, Span, MEMORY_SIZE};

/// Reasons the machine can stop with an error.
///
/// The `Display` text is the line appended to the output sink. All `line` fields are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Error, Diagnostic)]
pub enum Fault {
    #[error("Error: Invalid data value on line {line}: {literal}")]
    #[diagnostic(code(load::bad_data), help("`DAT` takes an optional integer literal"))]
    InvalidData { line: usize, literal: String },

    #[error("Error: Program Counter out of bounds.")]
    #[diagnostic(
        code(run::pc_bounds),
        help("end the program with `HLT` instead of running past its last line")
    )]
    PcOutOfBounds { pc: usize },

    #[error("Error: Undefined label or invalid operand on line {line}")]
    #[diagnostic(code(run::undefined_label))]
    UndefinedLabel { line: usize, operand: String },

    #[error("Error: Unknown instruction {name} on line {line}")]
    #[diagnostic(code(run::unknown_instruction))]
    UnknownInstruction { line: usize, name: String },

    #[error("Error: Invalid input. Please enter an integer.")]
    #[diagnostic(code(run::bad_input))]
    InvalidInput { input: String },

    #[error("Runtime Error: Memory address out of bounds: {address} on line {line}")]
    #[diagnostic(code(run::memory_bounds), help("addresses range from 0 to 99"))]
    MemoryOutOfBounds { line: usize, address: i64 },

    #[error("Runtime Error: Branch target out of bounds: {address} on line {line}")]
    #[diagnostic(code(run::branch_bounds))]
    BranchOutOfBounds { line: usize, address: i64 },
}

// Checker errors

pub fn check_bad_line(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "check::line_format",
        help = "lines take the form `[LABEL:] MNEMONIC [OPERAND] [// comment]`",
        labels = vec![LabeledSpan::at(span, "unexpected token")],
        "Syntax error. Invalid line format.",
    )
    .with_source_code(src.to_string())
}

pub fn check_unknown_instruction(span: Span, src: &str, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "check::unknown_instruction",
        help = "valid mnemonics are ADD, SUB, STA, LDA, BRA, BRZ, BRP, INP, OUT, HLT and DAT",
        labels = vec![LabeledSpan::at(span, "unknown instruction")],
        "Unknown instruction '{name}'.",
    )
    .with_source_code(src.to_string())
}

pub fn check_missing_operand(span: Span, src: &str, mnemonic: Mnemonic) -> Report {
    miette!(
        severity = Severity::Error,
        code = "check::missing_operand",
        help = "provide an address, a label or, for DAT, an integer value",
        labels = vec![LabeledSpan::at(span, "operand expected after this")],
        "Instruction '{mnemonic}' requires an operand.",
    )
    .with_source_code(src.to_string())
}

pub fn check_extra_operand(span: Span, src: &str, mnemonic: Mnemonic) -> Report {
    miette!(
        severity = Severity::Error,
        code = "check::extra_operand",
        help = "INP, OUT and HLT operate on the accumulator only",
        labels = vec![LabeledSpan::at(span, "unexpected operand")],
        "Instruction '{mnemonic}' does not take an operand.",
    )
    .with_source_code(src.to_string())
}

pub fn check_duplicate_label(span: Span, src: &str, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "check::duplicate_label",
        help = "labels are only allowed once per file",
        labels = vec![LabeledSpan::at(span, "duplicate label")],
        "Duplicate label definition: '{name}'.",
    )
    .with_source_code(src.to_string())
}

pub fn check_undefined_label(span: Span, src: &str, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "check::undefined_label",
        help = format!("declare the label with `{name}:` at the start of a line"),
        labels = vec![LabeledSpan::at(span, "undefined label")],
        "Undefined label: '{name}'.",
    )
    .with_source_code(src.to_string())
}

pub fn check_bad_data(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "check::bad_data",
        help = "DAT values must be integer literals",
        labels = vec![LabeledSpan::at(span, "not an integer")],
        "Invalid data value.",
    )
    .with_source_code(src.to_string())
}

pub fn check_too_long(span: Span, src: &str, lines: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "check::too_long",
        help = format!("the machine has {MEMORY_SIZE} memory cells, one per line"),
        labels = vec![LabeledSpan::at(span, "first line without a memory cell")],
        "Program is {lines} lines long and does not fit in memory.",
    )
    .with_source_code(src.to_string())
}
