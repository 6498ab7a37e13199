use crate::lexer::cursor::Cursor;
use crate::symbol::{is_label_name, Span};

pub mod cursor;

/// A single token of a source line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Text of the token. For label declarations this excludes the colon.
    pub text: &'a str,
    /// Position relative to the start of the whole source.
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Identifier immediately followed by a colon
    Label,
    /// Mnemonic or label reference
    Ident,
    /// Decimal integer literal, optionally signed
    Int,
    /// `;` or `//` up to the end of the line
    Comment,
    Whitespace,
    /// Anything else, up to the next whitespace
    Unknown,
    Eof,
}

/// Test if a character is considered to be whitespace.
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Test if a character can appear inside an identifier.
pub(crate) fn is_id(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

impl Cursor<'_> {
    fn at_comment(&self) -> bool {
        self.first() == ';' || (self.first() == '/' && self.second() == '/')
    }

    fn take_word(&mut self) {
        while !self.is_eof() && !is_whitespace(self.first()) && !self.at_comment() {
            self.bump();
        }
    }

    /// Returns the kind and byte length of the next token.
    pub fn advance_token(&mut self) -> (TokenKind, usize) {
        if self.is_eof() {
            return (TokenKind::Eof, 0);
        }
        let kind = if self.at_comment() {
            self.take_while(|_| true);
            TokenKind::Comment
        } else if is_whitespace(self.first()) {
            self.take_while(is_whitespace);
            TokenKind::Whitespace
        } else if is_id(self.first()) {
            // Label names can't start with a digit
            let is_name = !self.first().is_ascii_digit();
            self.take_while(is_id);
            if is_name && self.first() == ':' {
                self.bump();
                TokenKind::Label
            } else {
                self.take_word();
                // Classified by the caller, which has the text
                TokenKind::Unknown
            }
        } else {
            self.take_word();
            TokenKind::Unknown
        };
        let len = self.pos_in_token();
        self.reset_pos();
        (kind, len)
    }
}

fn classify(text: &str) -> TokenKind {
    if text.parse::<i64>().is_ok() {
        TokenKind::Int
    } else if is_label_name(text) {
        TokenKind::Ident
    } else {
        TokenKind::Unknown
    }
}

/// Tokenize one line. `offset` is the byte position of the line within the whole source.
///
/// Whitespace and comments are dropped.
pub fn tokenize(line: &str, offset: usize) -> Vec<Token<'_>> {
    let mut cursor = Cursor::new(line);
    let mut tokens = Vec::new();
    let mut pos = 0;
    loop {
        let (kind, len) = cursor.advance_token();
        let raw = &line[pos..pos + len];
        let span = Span::new(offset + pos, len);
        pos += len;
        let token = match kind {
            TokenKind::Eof => break,
            TokenKind::Whitespace | TokenKind::Comment => continue,
            TokenKind::Label => Token {
                kind,
                text: &raw[..raw.len() - 1],
                span,
            },
            _ => Token {
                kind: classify(raw),
                text: raw,
                span,
            },
        };
        tokens.push(token);
    }
    tokens
}

/// Whether the line holds nothing but whitespace and comments.
pub fn is_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with("//")
}
