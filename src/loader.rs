use crate::error::Fault;
use crate::lexer::{self, Token, TokenKind};
use crate::symbol::{Labels, Mnemonic, MEMORY_SIZE};

/// Assembled program: decoded source lines, label table and initial memory image.
///
/// Line index and memory address coincide.
#[derive(Clone, Debug)]
pub struct Program {
    source: Vec<String>,
    lines: Vec<Line>,
    labels: Labels,
    memory: [i64; MEMORY_SIZE],
}

/// One source line after label declarations have been stripped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    /// Empty or comment-only.
    Blank,
    /// Declares or mentions a label, and nothing else.
    LabelOnly,
    Statement {
        /// Instruction token as written.
        name: String,
        /// `None` if `name` is not a known mnemonic.
        mnemonic: Option<Mnemonic>,
        operand: Option<Operand>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Literal(i64),
    /// Resolved against the label table when the instruction executes.
    Symbol(String),
}

/// Result of loading a source text.
///
/// A malformed `DAT` literal stops loading at that line and is returned as `fault`; the program
/// then holds everything loaded before it.
#[derive(Debug)]
pub struct Assembly {
    pub program: Program,
    pub fault: Option<Fault>,
}

impl Program {
    /// Scan the source once, binding labels and encoding every line into its memory cell.
    pub fn assemble(src: &str) -> Assembly {
        let mut labels = Labels::new();
        let mut memory = [0; MEMORY_SIZE];
        let mut source = Vec::new();
        // Tokens left after stripping a label declaration, `None` for blank lines
        let mut bodies: Vec<Option<Vec<Token>>> = Vec::new();
        let mut fault = None;

        for (index, (offset, text)) in split_lines(src).enumerate() {
            source.push(text.trim_end_matches('\r').to_string());
            if lexer::is_blank(text) {
                bodies.push(None);
                continue;
            }

            let mut tokens = lexer::tokenize(text, offset);
            if tokens.first().is_some_and(|token| token.kind == TokenKind::Label) {
                let label = tokens.remove(0);
                labels.declare(label.text, index);
            }

            match encode(&tokens, index) {
                Ok(Some(cell)) if index < MEMORY_SIZE => memory[index] = cell,
                Ok(_) => (),
                Err(error) => {
                    bodies.push(None);
                    fault = Some(error);
                    break;
                }
            }
            bodies.push(Some(tokens));
        }

        let lines = bodies
            .iter()
            .map(|body| match body {
                Some(tokens) => decode(tokens, &labels),
                None => Line::Blank,
            })
            .collect();

        Assembly {
            program: Program {
                source,
                lines,
                labels,
                memory,
            },
            fault,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Original text of a line, without its line terminator.
    pub fn source_line(&self, index: usize) -> Option<&str> {
        self.source.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn memory(&self) -> &[i64; MEMORY_SIZE] {
        &self.memory
    }
}

/// Iterate lines together with their byte offset in `src`.
pub(crate) fn split_lines(src: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    src.split('\n').map(move |line| {
        let start = offset;
        offset += line.len() + 1;
        (start, line)
    })
}

/// Memory cell for a line, or `None` if the line does not start with a mnemonic.
fn encode(tokens: &[Token], index: usize) -> Result<Option<i64>, Fault> {
    let Some(first) = tokens.first() else {
        return Ok(None);
    };
    let operand = tokens.get(1);
    match first.text.parse::<Mnemonic>() {
        Ok(Mnemonic::Dat) => match operand {
            None => Ok(Some(0)),
            Some(token) => match token.text.parse::<i64>() {
                Ok(value) => Ok(Some(value)),
                Err(_) => Err(Fault::InvalidData {
                    line: index + 1,
                    literal: token.text.to_string(),
                }),
            },
        },
        Ok(mnemonic) => {
            // Symbolic operands are encoded as 0 and resolved on execution
            let value = operand
                .and_then(|token| token.text.parse::<i64>().ok())
                .unwrap_or(0);
            let opcode = mnemonic.opcode().unwrap_or(0);
            Ok(Some(opcode.wrapping_add(value)))
        }
        Err(()) => Ok(None),
    }
}

fn decode(tokens: &[Token], labels: &Labels) -> Line {
    let mut tokens = tokens;
    // A bare reference to a declared label in front of an instruction is skipped
    if let [first, rest @ ..] = tokens {
        if first.text.parse::<Mnemonic>().is_err() && labels.contains(first.text) {
            if rest.is_empty() {
                return Line::LabelOnly;
            }
            tokens = rest;
        }
    }

    let Some(first) = tokens.first() else {
        return Line::LabelOnly;
    };
    let operand = tokens.get(1).map(|token| match token.text.parse::<i64>() {
        Ok(value) => Operand::Literal(value),
        Err(_) => Operand::Symbol(token.text.to_string()),
    });
    Line::Statement {
        name: first.text.to_string(),
        mnemonic: first.text.parse().ok(),
        operand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(src: &str) -> Program {
        let assembly = Program::assemble(src);
        assert_eq!(assembly.fault, None);
        assembly.program
    }

    #[test]
    fn encodes_instructions() {
        let program = assemble("INP\nSTA 99\nADD 99\nOUT\nHLT");
        assert_eq!(program.memory()[..5], [901, 399, 199, 902, 0]);
        assert_eq!(program.len(), 5);
    }

    #[test]
    fn data_is_stored_verbatim() {
        let program = assemble("DAT 5\nDAT\nDAT -3");
        assert_eq!(program.memory()[..3], [5, 0, -3]);
        assert_eq!(
            program.line(0),
            Some(&Line::Statement {
                name: "DAT".into(),
                mnemonic: Some(Mnemonic::Dat),
                operand: Some(Operand::Literal(5)),
            })
        );
    }

    #[test]
    fn labels_bind_to_line_index() {
        let program = assemble("// counter\n\nLOOP: LDA one\nBRA LOOP\none: DAT 1");
        assert_eq!(program.labels().get("LOOP"), Some(2));
        assert_eq!(program.labels().get("one"), Some(4));
        // Symbolic operand is encoded as 0
        assert_eq!(program.memory()[2], 500);
        assert_eq!(program.memory()[3], 600);
        assert_eq!(program.line(0), Some(&Line::Blank));
        assert_eq!(program.line(1), Some(&Line::Blank));
        assert_eq!(
            program.line(3),
            Some(&Line::Statement {
                name: "BRA".into(),
                mnemonic: Some(Mnemonic::Bra),
                operand: Some(Operand::Symbol("LOOP".into())),
            })
        );
    }

    #[test]
    fn first_label_definition_wins() {
        let program = assemble("X: HLT\nX: HLT");
        assert_eq!(program.labels().get("X"), Some(0));
    }

    #[test]
    fn numeric_label_is_not_declared() {
        let program = assemble("5: HLT");
        assert!(program.labels().is_empty());
        assert_eq!(program.memory()[0], 0);
        assert_eq!(
            program.line(0),
            Some(&Line::Statement {
                name: "5:".into(),
                mnemonic: None,
                operand: Some(Operand::Symbol("HLT".into())),
            })
        );
    }

    #[test]
    fn label_only_lines() {
        let program = assemble("start:\nstart\nstart OUT");
        assert_eq!(program.line(0), Some(&Line::LabelOnly));
        assert_eq!(program.line(1), Some(&Line::LabelOnly));
        assert_eq!(
            program.line(2),
            Some(&Line::Statement {
                name: "OUT".into(),
                mnemonic: Some(Mnemonic::Out),
                operand: None,
            })
        );
    }

    #[test]
    fn unknown_lines_are_zero_cells() {
        let program = assemble("FOO 12\nlda 7");
        assert_eq!(program.memory()[..2], [0, 507]);
        assert!(matches!(
            program.line(0),
            Some(Line::Statement { mnemonic: None, .. })
        ));
    }

    #[test]
    fn malformed_data_stops_loading() {
        let assembly = Program::assemble("DAT 1\nDAT two\nDAT 3");
        assert_eq!(
            assembly.fault,
            Some(Fault::InvalidData {
                line: 2,
                literal: "two".into()
            })
        );
        assert_eq!(assembly.program.memory()[..3], [1, 0, 0]);
    }

    #[test]
    fn lines_past_memory_are_kept() {
        let src = "OUT\n".repeat(MEMORY_SIZE) + "HLT";
        let program = assemble(&src);
        assert_eq!(program.len(), MEMORY_SIZE + 1);
        assert_eq!(program.memory()[MEMORY_SIZE - 1], 902);
    }
}
