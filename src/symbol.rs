use std::{fmt, str::FromStr};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use miette::SourceSpan;

/// Number of addressable memory cells.
pub const MEMORY_SIZE: usize = 100;

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Symbol table of label -> memory address (line number), in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels(FxMap<String, usize>);

impl Labels {
    pub fn new() -> Self {
        Labels(IndexMap::with_hasher(FxBuildHasher::default()))
    }

    /// Bind `name` to `address`. The first definition wins.
    ///
    /// Returns `false` if the label was already declared.
    pub fn declare(&mut self, name: &str, address: usize) -> bool {
        if self.0.contains_key(name) {
            return false;
        }
        self.0.insert(name.to_string(), address);
        true
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(name, address)| (name.as_str(), *address))
    }
}

/// Location within source
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Span {
    offs: usize,
    len: usize,
}

impl Span {
    pub fn new(offs: usize, len: usize) -> Self {
        Span { offs, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn offs(&self) -> usize {
        self.offs
    }
}

impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.offs().into(), value.len())
    }
}

/// The eleven mnemonics of the machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    Add,
    Sub,
    Sta,
    Lda,
    Bra,
    Brz,
    Brp,
    Inp,
    Out,
    Hlt,
    Dat,
}

impl Mnemonic {
    /// Numeric prefix used when encoding a memory cell.
    ///
    /// `DAT` has no opcode: its cell holds the raw data value.
    pub fn opcode(self) -> Option<i64> {
        match self {
            Mnemonic::Add => Some(100),
            Mnemonic::Sub => Some(200),
            Mnemonic::Sta => Some(300),
            Mnemonic::Lda => Some(500),
            Mnemonic::Bra => Some(600),
            Mnemonic::Brz => Some(700),
            Mnemonic::Brp => Some(800),
            Mnemonic::Inp => Some(901),
            Mnemonic::Out => Some(902),
            Mnemonic::Hlt => Some(0),
            Mnemonic::Dat => None,
        }
    }

    /// Whether the instruction must be followed by an operand.
    pub fn takes_operand(self) -> bool {
        !matches!(self, Mnemonic::Inp | Mnemonic::Out | Mnemonic::Hlt)
    }
}

impl FromStr for Mnemonic {
    type Err = ();

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADD" => Ok(Mnemonic::Add),
            "SUB" => Ok(Mnemonic::Sub),
            "STA" => Ok(Mnemonic::Sta),
            "LDA" => Ok(Mnemonic::Lda),
            "BRA" => Ok(Mnemonic::Bra),
            "BRZ" => Ok(Mnemonic::Brz),
            "BRP" => Ok(Mnemonic::Brp),
            "INP" => Ok(Mnemonic::Inp),
            "OUT" => Ok(Mnemonic::Out),
            "HLT" => Ok(Mnemonic::Hlt),
            "DAT" => Ok(Mnemonic::Dat),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mnemonic::Add => "ADD",
            Mnemonic::Sub => "SUB",
            Mnemonic::Sta => "STA",
            Mnemonic::Lda => "LDA",
            Mnemonic::Bra => "BRA",
            Mnemonic::Brz => "BRZ",
            Mnemonic::Brp => "BRP",
            Mnemonic::Inp => "INP",
            Mnemonic::Out => "OUT",
            Mnemonic::Hlt => "HLT",
            Mnemonic::Dat => "DAT",
        };
        write!(f, "{name}")
    }
}

/// Test if a string is a valid label identifier.
pub fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_case_insensitive() {
        assert_eq!("lda".parse(), Ok(Mnemonic::Lda));
        assert_eq!("BrP".parse(), Ok(Mnemonic::Brp));
        assert_eq!("JMP".parse::<Mnemonic>(), Err(()));
    }

    #[test]
    fn first_label_definition_wins() {
        let mut labels = Labels::new();
        assert!(labels.declare("LOOP", 2));
        assert!(!labels.declare("LOOP", 7));
        assert_eq!(labels.get("LOOP"), Some(2));
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn label_names() {
        assert!(is_label_name("_start"));
        assert!(is_label_name("loop2"));
        assert!(!is_label_name("2loop"));
        assert!(!is_label_name("a-b"));
        assert!(!is_label_name(""));
    }
}
