//! Maps a parsed [`Command`] onto [`CacheStore`] operations and produces a
//! typed outcome that both response formatters render from.

use std::time::Duration;

use crate::cache::{CacheStore, CacheValue};
use crate::error::{CacheError, Result};

use super::command::Command;

/// The result of dispatching one command, carrying both the inputs the
/// response formatters need for their human-readable phrasing and the
/// operation's return datum.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Get { key: String, value: Option<CacheValue> },
    Set { key: String, value: String, prior: Option<CacheValue> },
    Update { key: String, old: String, new: String, updated: bool },
    Remove { key: String, value: Option<CacheValue>, removed: bool },
    Keys { keys: Vec<String> },
    Ttl { key: String, updated: bool },
    Size { size: usize },
    LGet { key: String, value: Option<String> },
    LAppend { key: String, value: String },
    LDelete { key: String, value: String },
    LSize { key: String, size: usize },
    DGet { key: String, dict_key: String, value: Option<String> },
    DSet { key: String, dict_key: String, value: String, prior: Option<String> },
    DAppend { key: String, dict_key: String, appended: bool },
    DDelete { key: String, dict_key: String, value: Option<String> },
    DSize { key: String, size: usize },
    Help,
    Exit,
}

/// Converts a caller-supplied signed second count into a ttl. Non-positive
/// values disable expiry, matching the reference implementation's
/// `ttl * time.Second` conversion where a zero-or-negative result means
/// "no ttl".
fn ttl_from_secs(secs: Option<i64>) -> Duration {
    match secs {
        Some(s) if s > 0 => Duration::from_secs(s as u64),
        _ => Duration::ZERO,
    }
}

pub fn dispatch(store: &CacheStore, command: Command) -> Result<CommandOutcome> {
    match command {
        Command::Get { key } => {
            let value = store.get(&key);
            Ok(CommandOutcome::Get { key, value })
        }
        Command::Set { key, value, ttl_secs } => {
            let prior = store.put_expirable(
                &key,
                CacheValue::Scalar(value.clone()),
                ttl_from_secs(ttl_secs),
            );
            Ok(CommandOutcome::Set { key, value, prior })
        }
        Command::Update { key, old, new, ttl_secs } => {
            let updated = match ttl_secs {
                Some(_) => store.replace_value_expirable(
                    &key,
                    &CacheValue::Scalar(old.clone()),
                    CacheValue::Scalar(new.clone()),
                    ttl_from_secs(ttl_secs),
                ),
                None => store.replace_value(
                    &key,
                    &CacheValue::Scalar(old.clone()),
                    CacheValue::Scalar(new.clone()),
                ),
            };
            Ok(CommandOutcome::Update { key, old, new, updated })
        }
        Command::Delete { key, value } => match value {
            None => {
                let removed = store.remove(&key);
                let present = removed.is_some();
                Ok(CommandOutcome::Remove { key, value: removed, removed: present })
            }
            Some(v) => {
                let removed = store.remove_pair(&key, &CacheValue::Scalar(v.clone()));
                Ok(CommandOutcome::Remove {
                    key,
                    value: Some(CacheValue::Scalar(v)),
                    removed,
                })
            }
        },
        Command::Keys { start, stop } => {
            let keys = store.keys();
            let sliced = slice_keys(&keys, start, stop)?;
            Ok(CommandOutcome::Keys { keys: sliced })
        }
        Command::Ttl { key, ttl_secs } => {
            let ttl = if ttl_secs > 0 {
                Duration::from_secs(ttl_secs as u64)
            } else {
                Duration::ZERO
            };
            let updated = store.update_ttl(&key, ttl);
            Ok(CommandOutcome::Ttl { key, updated })
        }
        Command::Size => Ok(CommandOutcome::Size { size: store.size() }),
        Command::LGet { key, index } => {
            let value = match store.get(&key) {
                None => None,
                Some(v) => Some(v.as_list(&key)?.get(index)?),
            };
            Ok(CommandOutcome::LGet { key, value })
        }
        Command::LAppend { key, value, ttl_secs } => {
            store.append_list(&key, value.clone(), ttl_from_secs(ttl_secs))?;
            Ok(CommandOutcome::LAppend { key, value })
        }
        Command::LDelete { key, index } => {
            let value = store
                .get(&key)
                .ok_or(CacheError::OutOfBounds)?
                .as_list(&key)?
                .remove(index)?;
            Ok(CommandOutcome::LDelete { key, value })
        }
        Command::LSize { key } => {
            let size = match store.get(&key) {
                None => 0,
                Some(v) => v.as_list(&key)?.size(),
            };
            Ok(CommandOutcome::LSize { key, size })
        }
        Command::DGet { key, dict_key } => {
            let value = match store.get(&key) {
                None => None,
                Some(v) => v.as_dict(&key)?.get(&dict_key),
            };
            Ok(CommandOutcome::DGet { key, dict_key, value })
        }
        Command::DSet { key, dict_key, value } => {
            let prior = store.set_dict(&key, dict_key.clone(), value.clone())?;
            Ok(CommandOutcome::DSet { key, dict_key, value, prior })
        }
        Command::DAppend { key, dict_key, value } => {
            let appended = store.append_dict(&key, dict_key.clone(), value.clone())?;
            Ok(CommandOutcome::DAppend { key, dict_key, appended })
        }
        Command::DDelete { key, dict_key } => {
            let value = match store.get(&key) {
                None => None,
                Some(v) => v.as_dict(&key)?.remove(&dict_key),
            };
            Ok(CommandOutcome::DDelete { key, dict_key, value })
        }
        Command::DSize { key } => {
            let size = match store.get(&key) {
                None => 0,
                Some(v) => v.as_dict(&key)?.size(),
            };
            Ok(CommandOutcome::DSize { key, size })
        }
        Command::Help => Ok(CommandOutcome::Help),
        Command::Exit => Ok(CommandOutcome::Exit),
    }
}

/// Slices the live key list by `[start, stop)`. Unlike the reference
/// implementation (which compares both bounds against the wrong length,
/// effectively never rejecting an in-range `stop`), this validates both
/// `start` and `stop` against the actual key count and rejects either one
/// out of range.
fn slice_keys(keys: &[String], start: Option<i64>, stop: Option<i64>) -> Result<Vec<String>> {
    let len = keys.len() as i64;
    let start = match start {
        None => return Ok(keys.to_vec()),
        Some(s) => s,
    };
    if start < 0 || start > len {
        return Err(CacheError::BadArgument(format!("Too big integer [{start}]")));
    }
    let stop = match stop {
        None => len,
        Some(s) => {
            if s < start || s > len {
                return Err(CacheError::BadArgument(format!("Too big integer [{s}]")));
            }
            s
        }
    };
    Ok(keys[start as usize..stop as usize].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::parse;

    fn run(store: &CacheStore, line: &str) -> Result<CommandOutcome> {
        dispatch(store, parse(line).unwrap())
    }

    #[test]
    fn set_then_get_roundtrips() {
        let store = CacheStore::new();
        run(&store, "set K V").unwrap();
        match run(&store, "get K").unwrap() {
            CommandOutcome::Get { value: Some(CacheValue::Scalar(v)), .. } => assert_eq!(v, "V"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn update_cas_succeeds_only_on_matching_old_value() {
        let store = CacheStore::new();
        run(&store, "set K V").unwrap();
        match run(&store, "update K wrong new").unwrap() {
            CommandOutcome::Update { updated, .. } => assert!(!updated),
            _ => unreachable!(),
        }
        match run(&store, "update K V new").unwrap() {
            CommandOutcome::Update { updated, .. } => assert!(updated),
            _ => unreachable!(),
        }
    }

    #[test]
    fn ttl_zero_seconds_never_expires() {
        let store = CacheStore::new();
        run(&store, "set K V").unwrap();
        run(&store, "ttl K 0").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        match run(&store, "get K").unwrap() {
            CommandOutcome::Get { value, .. } => assert!(value.is_some()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn lappend_auto_creates_list() {
        let store = CacheStore::new();
        run(&store, "lappend L x").unwrap();
        match run(&store, "lget L 0").unwrap() {
            CommandOutcome::LGet { value: Some(v), .. } => assert_eq!(v, "x"),
            other => panic!("unexpected: {other:?}"),
        }
        match run(&store, "lsize L").unwrap() {
            CommandOutcome::LSize { size, .. } => assert_eq!(size, 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn ldelete_out_of_bounds_on_missing_key() {
        let store = CacheStore::new();
        assert!(matches!(run(&store, "ldelete L 5"), Err(CacheError::OutOfBounds)));
    }

    #[test]
    fn dget_on_scalar_key_is_type_mismatch() {
        let store = CacheStore::new();
        run(&store, "set K scalar").unwrap();
        let err = run(&store, "dget K f").unwrap_err();
        assert_eq!(
            err.to_string(),
            "The value for the key [K] is not a dictionary."
        );
    }

    #[test]
    fn keys_slice_rejects_out_of_range_start_and_stop() {
        let store = CacheStore::new();
        run(&store, "set a 1").unwrap();
        run(&store, "set b 2").unwrap();
        assert!(matches!(run(&store, "keys 5"), Err(CacheError::BadArgument(_))));
        assert!(matches!(run(&store, "keys 0 5"), Err(CacheError::BadArgument(_))));
        match run(&store, "keys 0 2").unwrap() {
            CommandOutcome::Keys { keys } => assert_eq!(keys.len(), 2),
            _ => unreachable!(),
        }
    }

    #[test]
    fn dappend_reports_whether_insert_happened() {
        let store = CacheStore::new();
        match run(&store, "dappend D f 1").unwrap() {
            CommandOutcome::DAppend { appended, .. } => assert!(appended),
            _ => unreachable!(),
        }
        match run(&store, "dappend D f 2").unwrap() {
            CommandOutcome::DAppend { appended, .. } => assert!(!appended),
            _ => unreachable!(),
        }
    }
}
