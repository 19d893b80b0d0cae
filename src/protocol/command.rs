//! Wire command grammar: `<name> [arg ...]`, single-space separated.

use crate::error::{CacheError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { key: String },
    Set { key: String, value: String, ttl_secs: Option<i64> },
    Update { key: String, old: String, new: String, ttl_secs: Option<i64> },
    Delete { key: String, value: Option<String> },
    Keys { start: Option<i64>, stop: Option<i64> },
    Ttl { key: String, ttl_secs: i64 },
    Size,
    LGet { key: String, index: i64 },
    LAppend { key: String, value: String, ttl_secs: Option<i64> },
    LDelete { key: String, index: i64 },
    LSize { key: String },
    DGet { key: String, dict_key: String },
    DSet { key: String, dict_key: String, value: String },
    DAppend { key: String, dict_key: String, value: String },
    DDelete { key: String, dict_key: String },
    DSize { key: String },
    Help,
    Exit,
}

/// Parses one already-trimmed command line into a [`Command`]. Arity and
/// argument-type validation happens here so the dispatcher can assume a
/// parsed `Command` is well-formed.
pub fn parse(line: &str) -> Result<Command> {
    let trimmed = line.trim();
    let mut tokens = trimmed.split(' ').filter(|t| !t.is_empty());
    let name = tokens.next().ok_or(CacheError::UnknownCommand)?;
    let args: Vec<&str> = tokens.collect();

    match name {
        "get" => {
            arity(&args, 1, 1)?;
            Ok(Command::Get { key: args[0].to_string() })
        }
        "set" => {
            arity(&args, 2, 3)?;
            let ttl_secs = optional_ttl(args.get(2))?;
            Ok(Command::Set {
                key: args[0].to_string(),
                value: args[1].to_string(),
                ttl_secs,
            })
        }
        "update" => {
            arity(&args, 3, 4)?;
            let ttl_secs = optional_ttl(args.get(3))?;
            Ok(Command::Update {
                key: args[0].to_string(),
                old: args[1].to_string(),
                new: args[2].to_string(),
                ttl_secs,
            })
        }
        "delete" => {
            arity(&args, 1, 2)?;
            Ok(Command::Delete {
                key: args[0].to_string(),
                value: args.get(1).map(|s| s.to_string()),
            })
        }
        "keys" => {
            arity(&args, 0, 2)?;
            let start = args.first().map(|s| parse_int(s)).transpose()?;
            let stop = args.get(1).map(|s| parse_int(s)).transpose()?;
            Ok(Command::Keys { start, stop })
        }
        "ttl" => {
            arity(&args, 2, 2)?;
            let ttl_secs = parse_int(args[1])?;
            Ok(Command::Ttl { key: args[0].to_string(), ttl_secs })
        }
        "size" => {
            arity(&args, 0, 0)?;
            Ok(Command::Size)
        }
        "lget" => {
            arity(&args, 2, 2)?;
            let index = parse_int(args[1])?;
            Ok(Command::LGet { key: args[0].to_string(), index })
        }
        "lappend" => {
            arity(&args, 2, 3)?;
            let ttl_secs = optional_ttl(args.get(2))?;
            Ok(Command::LAppend {
                key: args[0].to_string(),
                value: args[1].to_string(),
                ttl_secs,
            })
        }
        "ldelete" => {
            arity(&args, 2, 2)?;
            let index = parse_int(args[1])?;
            Ok(Command::LDelete { key: args[0].to_string(), index })
        }
        "lsize" => {
            arity(&args, 1, 1)?;
            Ok(Command::LSize { key: args[0].to_string() })
        }
        "dget" => {
            arity(&args, 2, 2)?;
            Ok(Command::DGet {
                key: args[0].to_string(),
                dict_key: args[1].to_string(),
            })
        }
        "dset" => {
            arity(&args, 3, 3)?;
            Ok(Command::DSet {
                key: args[0].to_string(),
                dict_key: args[1].to_string(),
                value: args[2].to_string(),
            })
        }
        "dappend" => {
            arity(&args, 3, 3)?;
            Ok(Command::DAppend {
                key: args[0].to_string(),
                dict_key: args[1].to_string(),
                value: args[2].to_string(),
            })
        }
        "ddelete" => {
            arity(&args, 2, 2)?;
            Ok(Command::DDelete {
                key: args[0].to_string(),
                dict_key: args[1].to_string(),
            })
        }
        "dsize" => {
            arity(&args, 1, 1)?;
            Ok(Command::DSize { key: args[0].to_string() })
        }
        "help" => Ok(Command::Help),
        "exit" => Ok(Command::Exit),
        _ => Err(CacheError::UnknownCommand),
    }
}

fn arity(args: &[&str], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        Err(CacheError::BadArity)
    } else {
        Ok(())
    }
}

fn parse_int(s: &str) -> Result<i64> {
    s.parse::<i64>()
        .map_err(|_| CacheError::BadArgument(format!("Invalid integer [{s}]")))
}

fn optional_ttl(token: Option<&&str>) -> Result<Option<i64>> {
    match token {
        None => Ok(None),
        Some(s) => Ok(Some(
            s.parse::<i64>()
                .map_err(|_| CacheError::BadArgument("Invalid \"ttl\" value".to_string()))?,
        )),
    }
}
