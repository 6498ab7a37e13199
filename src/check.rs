use miette::Report;

use crate::error;
use crate::lexer::{self, Token, TokenKind};
use crate::loader::split_lines;
use crate::symbol::{Labels, Mnemonic, Span, MEMORY_SIZE};

/// Check a program without running it.
///
/// Unlike the loader, which accepts anything it can make sense of, this reports every problem
/// found, in source order except for undefined labels, which come last.
pub fn check(src: &str) -> Vec<Report> {
    let mut errors = Vec::new();
    let mut defined = Labels::new();
    let mut used: Vec<Token> = Vec::new();

    // Trailing blank lines need no memory
    let length = split_lines(src)
        .collect::<Vec<_>>()
        .iter()
        .rposition(|(_, text)| !lexer::is_blank(text))
        .map_or(0, |index| index + 1);

    for (index, (offset, text)) in split_lines(src).enumerate() {
        if index == MEMORY_SIZE && length > MEMORY_SIZE {
            let len = text.trim_end_matches('\r').len();
            errors.push(error::check_too_long(Span::new(offset, len), src, length));
        }
        if lexer::is_blank(text) {
            continue;
        }

        let mut tokens = lexer::tokenize(text, offset).into_iter().peekable();
        if let Some(label) = tokens.next_if(|token| token.kind == TokenKind::Label) {
            if !defined.declare(label.text, index) {
                errors.push(error::check_duplicate_label(label.span, src, label.text));
            }
        }

        let Some(instruction) = tokens.next() else {
            continue;
        };
        let mnemonic = match instruction.text.parse::<Mnemonic>() {
            Ok(mnemonic) if instruction.kind == TokenKind::Ident => mnemonic,
            _ if instruction.kind == TokenKind::Ident => {
                errors.push(error::check_unknown_instruction(
                    instruction.span,
                    src,
                    instruction.text,
                ));
                continue;
            }
            _ => {
                errors.push(error::check_bad_line(instruction.span, src));
                continue;
            }
        };

        match (mnemonic.takes_operand(), tokens.next()) {
            (true, None) => {
                errors.push(error::check_missing_operand(instruction.span, src, mnemonic));
            }
            (false, Some(operand)) => {
                errors.push(error::check_extra_operand(operand.span, src, mnemonic));
            }
            (true, Some(operand)) => match (mnemonic, operand.kind) {
                (_, TokenKind::Int) => (),
                (Mnemonic::Dat, _) => errors.push(error::check_bad_data(operand.span, src)),
                (_, TokenKind::Ident) => used.push(operand),
                _ => errors.push(error::check_bad_line(operand.span, src)),
            },
            (false, None) => (),
        }

        if let Some(extra) = tokens.next() {
            errors.push(error::check_bad_line(extra.span, src));
        }
    }

    for token in used {
        if !defined.contains(token.text) {
            errors.push(error::check_undefined_label(token.span, src, token.text));
        }
    }
    errors
}
