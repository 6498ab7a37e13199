use std::fmt;
use std::str::SplitWhitespace;

use super::error::{ArgumentError, CommandError, ValueError};
use crate::symbol::is_label_name;

#[derive(Debug, PartialEq)]
pub enum Command<'a> {
    Help,
    Step { count: u32 },
    Continue,
    Quit,
    Registers,
    Memory,
    Labels,
    Reset,
    BreakList,
    /// `None` for the line under the program counter.
    BreakAdd { location: Option<Location<'a>> },
    BreakRemove { location: Option<Location<'a>> },
    Source { location: Option<Location<'a>> },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommandName {
    Help,
    Step,
    Continue,
    Quit,
    Registers,
    Memory,
    Labels,
    Reset,
    BreakList,
    BreakAdd,
    BreakRemove,
    Source,
}

/// A source line, as typed by the user.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Location<'a> {
    /// 1-based line number
    Line(usize),
    Label(&'a str),
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => write!(f, "help"),
            Self::Step => write!(f, "step"),
            Self::Continue => write!(f, "continue"),
            Self::Quit => write!(f, "quit"),
            Self::Registers => write!(f, "registers"),
            Self::Memory => write!(f, "memory"),
            Self::Labels => write!(f, "labels"),
            Self::Reset => write!(f, "reset"),
            Self::BreakList => write!(f, "break list"),
            Self::BreakAdd => write!(f, "break add"),
            Self::BreakRemove => write!(f, "break remove"),
            Self::Source => write!(f, "source"),
        }
    }
}

#[rustfmt::skip]
const COMMANDS: CommandNameList = &[
    (CommandName::Help,        &["help", "--help", "h", "-h"]),
    (CommandName::Step,        &["step", "s"]),
    (CommandName::Continue,    &["continue", "cont", "c"]),
    (CommandName::Quit,        &["quit", "exit", "q"]),
    (CommandName::Registers,   &["registers", "reg", "r"]),
    (CommandName::Memory,      &["memory", "mem", "m"]),
    (CommandName::Labels,      &["labels", "l"]),
    (CommandName::Reset,       &["reset"]),
    (CommandName::Source,      &["source", "src"]),
    (CommandName::BreakList,   &["breaklist", "bl"]),
    (CommandName::BreakAdd,    &["breakadd", "ba"]),
    (CommandName::BreakRemove, &["breakremove", "br"]),
    // "break" is treated specially
];
const BREAK_COMMAND: CandidateList = &["break", "b"];
#[rustfmt::skip]
const BREAK_SUBCOMMANDS: CommandNameList = &[
    (CommandName::BreakList,   &["list", "l"]),
    (CommandName::BreakAdd,    &["add", "a"]),
    (CommandName::BreakRemove, &["remove", "r"]),
];

/// A [`CommandName`] with a list of name candidates.
type CommandNameList<'a> = &'a [(CommandName, CandidateList<'a>)];
/// List of single-word aliases for a command or subcommand.
type CandidateList<'a> = &'a [&'a str];

impl<'a> TryFrom<&'a str> for Command<'a> {
    type Error = CommandError;

    /// Assumes line is non-empty.
    fn try_from(line: &'a str) -> Result<Self, Self::Error> {
        let mut args = Arguments::from(line);
        let command_name = args.command_name()?;
        Command::parse_arguments(command_name, &mut args).map_err(|error| {
            CommandError::InvalidArgument {
                command_name,
                error,
            }
        })
    }
}

impl<'a> Command<'a> {
    fn parse_arguments(name: CommandName, args: &mut Arguments<'a>) -> Result<Self, ArgumentError> {
        let mut expected_args = 0;

        let command = match name {
            // Allow trailing arguments
            CommandName::Help => return Ok(Self::Help),

            CommandName::Continue => Self::Continue,
            CommandName::Quit => Self::Quit,
            CommandName::Registers => Self::Registers,
            CommandName::Memory => Self::Memory,
            CommandName::Labels => Self::Labels,
            CommandName::Reset => Self::Reset,
            CommandName::BreakList => Self::BreakList,

            CommandName::Step => {
                expected_args = 1;
                let count = args.next_positive_integer("count")?.unwrap_or(1);
                Self::Step { count }
            }
            CommandName::BreakAdd => {
                expected_args = 1;
                let location = args.next_location("location")?;
                Self::BreakAdd { location }
            }
            CommandName::BreakRemove => {
                expected_args = 1;
                let location = args.next_location("location")?;
                Self::BreakRemove { location }
            }
            CommandName::Source => {
                expected_args = 1;
                let location = args.next_location("location")?;
                Self::Source { location }
            }
        };

        args.expect_end(expected_args)?;
        Ok(command)
    }
}

/// Whitespace-separated words of a command line.
struct Arguments<'a> {
    words: SplitWhitespace<'a>,
    /// Arguments consumed, not including the command name
    count: u8,
}

impl<'a> From<&'a str> for Arguments<'a> {
    fn from(line: &'a str) -> Self {
        Self {
            words: line.split_whitespace(),
            count: 0,
        }
    }
}

impl<'a> Arguments<'a> {
    /// Parse next [`CommandName`].
    ///
    /// Considers multi-word command names (i.e. subcommands) as one name. Eg. "break add".
    fn command_name(&mut self) -> Result<CommandName, CommandError> {
        let command_name = self.words.next().unwrap_or("");

        if let Some(command) = find_name_match(command_name, COMMANDS) {
            return Ok(command);
        }

        // "break" is the only command with subcommands
        if name_matches(command_name, BREAK_COMMAND) {
            let command_name = BREAK_COMMAND[0];
            let Some(subcommand_name) = self.words.next() else {
                return Err(CommandError::MissingSubcommand { command_name });
            };
            return find_name_match(subcommand_name, BREAK_SUBCOMMANDS).ok_or_else(|| {
                CommandError::InvalidSubcommand {
                    command_name,
                    subcommand_name: subcommand_name.to_string(),
                }
            });
        }

        Err(CommandError::InvalidCommand {
            command_name: command_name.to_string(),
        })
    }

    fn next_argument(&mut self) -> Option<&'a str> {
        let word = self.words.next()?;
        self.count += 1;
        Some(word)
    }

    /// Returns `Ok(None)` if no argument is left.
    fn next_positive_integer(
        &mut self,
        argument_name: &'static str,
    ) -> Result<Option<u32>, ArgumentError> {
        let Some(word) = self.next_argument() else {
            return Ok(None);
        };
        parse_positive_integer(word)
            .map(Some)
            .map_err(|error| ArgumentError::InvalidValue {
                argument_name,
                error,
            })
    }

    /// Returns `Ok(None)` if no argument is left.
    fn next_location(
        &mut self,
        argument_name: &'static str,
    ) -> Result<Option<Location<'a>>, ArgumentError> {
        let Some(word) = self.next_argument() else {
            return Ok(None);
        };
        let location = if word.starts_with(|ch: char| ch.is_ascii_digit()) {
            parse_positive_integer(word).map(|line| Location::Line(line as usize))
        } else if is_label_name(word) {
            Ok(Location::Label(word))
        } else {
            Err(ValueError::MalformedValue)
        };
        location
            .map(Some)
            .map_err(|error| ArgumentError::InvalidValue {
                argument_name,
                error,
            })
    }

    fn expect_end(&mut self, expected_count: u8) -> Result<(), ArgumentError> {
        let extra = self.words.by_ref().count() as u8;
        if extra == 0 {
            return Ok(());
        }
        Err(ArgumentError::TooManyArguments {
            expected_count,
            actual_count: self.count.saturating_add(extra),
        })
    }
}

fn parse_positive_integer(word: &str) -> Result<u32, ValueError> {
    if !word.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValueError::MalformedInteger);
    }
    match word.parse::<u32>() {
        Ok(0) => Err(ValueError::ZeroValue),
        Ok(value) => Ok(value),
        Err(_) => Err(ValueError::IntegerTooLarge),
    }
}

/// Returns the first [`CommandName`], which has a corresponding candidate which matches `name`
/// (case insensitive).
fn find_name_match(name: &str, commands: CommandNameList) -> Option<CommandName> {
    commands
        .iter()
        .find(|(_, candidates)| name_matches(name, candidates))
        .map(|(command, _)| *command)
}

fn name_matches(name: &str, candidates: CandidateList) -> bool {
    candidates
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        Command::try_from(line)
    }

    #[test]
    fn names_and_aliases() {
        assert_eq!(parse("help"), Ok(Command::Help));
        assert_eq!(parse("  C  "), Ok(Command::Continue));
        assert_eq!(parse("reg"), Ok(Command::Registers));
        assert_eq!(parse("b l"), Ok(Command::BreakList));
        assert_eq!(parse("Break List"), Ok(Command::BreakList));
        assert_eq!(parse("help me please"), Ok(Command::Help));
    }

    #[test]
    fn step_count() {
        assert_eq!(parse("step"), Ok(Command::Step { count: 1 }));
        assert_eq!(parse("s 12"), Ok(Command::Step { count: 12 }));
        assert_eq!(
            parse("step 0"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::Step,
                error: ArgumentError::InvalidValue {
                    argument_name: "count",
                    error: ValueError::ZeroValue,
                },
            })
        );
        assert_eq!(
            parse("step -2"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::Step,
                error: ArgumentError::InvalidValue {
                    argument_name: "count",
                    error: ValueError::MalformedInteger,
                },
            })
        );
    }

    #[test]
    fn break_locations() {
        assert_eq!(
            parse("break add 4"),
            Ok(Command::BreakAdd {
                location: Some(Location::Line(4))
            })
        );
        assert_eq!(
            parse("br LOOP"),
            Ok(Command::BreakRemove {
                location: Some(Location::Label("LOOP"))
            })
        );
        assert_eq!(parse("ba"), Ok(Command::BreakAdd { location: None }));
        assert_eq!(
            parse("ba 4x"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::BreakAdd,
                error: ArgumentError::InvalidValue {
                    argument_name: "location",
                    error: ValueError::MalformedInteger,
                },
            })
        );
    }

    #[test]
    fn bad_commands() {
        assert_eq!(
            parse("jump 3"),
            Err(CommandError::InvalidCommand {
                command_name: "jump".into()
            })
        );
        assert_eq!(
            parse("break"),
            Err(CommandError::MissingSubcommand {
                command_name: "break"
            })
        );
        assert_eq!(
            parse("break all"),
            Err(CommandError::InvalidSubcommand {
                command_name: "break",
                subcommand_name: "all".into(),
            })
        );
        assert_eq!(
            parse("reset now"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::Reset,
                error: ArgumentError::TooManyArguments {
                    expected_count: 0,
                    actual_count: 1,
                },
            })
        );
        assert_eq!(
            parse("step 2 3").map_err(|error| error.to_string()),
            Err("In command `step`: Too many arguments (expected 1, found 2)".into())
        );
    }
}
