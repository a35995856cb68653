//! Trace files: one command per line, `<name>:<args>`.
//!
//! ```text
//! basic_tests:10
//! Insert:3,4.5
//! Get:3
//! Remove:3
//! ```
//!
//! `Insert`, `Remove` and `Get` drive the table, any other name is a
//! header directive and is carried along without being interpreted.

use thiserror::Error;

use crate::ReplayError;

pub const DELIMITER: char = ':';
pub const PAIR_DELIMITER: char = ',';

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("expected delimiter ':' but didn't find it")]
    MissingDelimiter,

    #[error("expected ',' between key and value in insert command")]
    MissingPairDelimiter,

    #[error("invalid key {0:?}")]
    InvalidKey(String),

    #[error("invalid value {0:?}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Insert { key: i32, value: f32 },
    Remove { key: i32 },
    Get { key: i32 },
    /// Anything that isn't a table operation, e.g. `basic_tests:10`
    Directive { name: String, args: String },
}

/// A command together with the (1-based) line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TraceLine {
    pub line: usize,
    pub command: Command,
}

pub fn parse_line(src: &str) -> Result<Command, ParseError> {
    let (name, args) = src
        .split_once(DELIMITER)
        .ok_or(ParseError::MissingDelimiter)?;

    let cmd = match name.trim() {
        "Insert" => {
            let (key, value) = args
                .split_once(PAIR_DELIMITER)
                .ok_or(ParseError::MissingPairDelimiter)?;
            Command::Insert {
                key: parse_key(key)?,
                value: parse_value(value)?,
            }
        }
        "Remove" => Command::Remove {
            key: parse_key(args)?,
        },
        "Get" => Command::Get {
            key: parse_key(args)?,
        },
        other => Command::Directive {
            name: other.into(),
            args: args.trim().into(),
        },
    };

    Ok(cmd)
}

/// Parses a whole trace, skipping blank lines
pub fn parse_trace(src: &str) -> Result<Vec<TraceLine>, ReplayError> {
    src.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            let line = i + 1;
            parse_line(l)
                .map(|command| TraceLine { line, command })
                .map_err(|source| ReplayError::Parse { line, source })
        })
        .collect()
}

fn parse_key(src: &str) -> Result<i32, ParseError> {
    let src = src.trim();
    src.parse()
        .map_err(|_| ParseError::InvalidKey(src.to_string()))
}

fn parse_value(src: &str) -> Result<f32, ParseError> {
    let src = src.trim();
    src.parse()
        .map_err(|_| ParseError::InvalidValue(src.to_string()))
}

#[cfg(test)]
mod test {
    use super::{Command, ParseError, TraceLine, parse_line, parse_trace};
    use crate::ReplayError;

    #[test]
    fn commands() {
        assert_eq!(
            parse_line("Insert:3,4.5"),
            Ok(Command::Insert { key: 3, value: 4.5 })
        );
        assert_eq!(
            parse_line("Insert: -7 , 1e3"),
            Ok(Command::Insert {
                key: -7,
                value: 1000.0
            })
        );
        assert_eq!(parse_line("Remove:12"), Ok(Command::Remove { key: 12 }));
        assert_eq!(parse_line("Get:0"), Ok(Command::Get { key: 0 }));
        assert_eq!(
            parse_line("dynamic_size:20"),
            Ok(Command::Directive {
                name: "dynamic_size".into(),
                args: "20".into()
            })
        );
    }

    #[test]
    fn malformed() {
        assert_eq!(parse_line("Insert 3,4"), Err(ParseError::MissingDelimiter));
        assert_eq!(parse_line("Insert:3"), Err(ParseError::MissingPairDelimiter));
        assert_eq!(
            parse_line("Get:three"),
            Err(ParseError::InvalidKey("three".into()))
        );
        assert_eq!(
            parse_line("Insert:3,abc"),
            Err(ParseError::InvalidValue("abc".into()))
        );
    }

    #[test]
    fn whole_trace_keeps_line_numbers() {
        let src = "basic_tests:10\n\nInsert:1,1.5\nGet:1\n";
        let lines = parse_trace(src).unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            TraceLine {
                line: 3,
                command: Command::Insert { key: 1, value: 1.5 }
            }
        );
        assert_eq!(lines[2].line, 4);

        match parse_trace("Insert:1,1\nRemove 1\n") {
            Err(ReplayError::Parse { line, source }) => {
                assert_eq!(line, 2);
                assert_eq!(source, ParseError::MissingDelimiter);
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
