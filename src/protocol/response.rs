//! Renders a [`CommandOutcome`] (or a dispatch error) into the bytes written
//! back to a client. Two independent formatters share the same dispatcher
//! output: a structured, newline-terminated JSON record for programmatic
//! clients, and a CRLF-terminated human-readable line for interactive ones.

use serde::{Deserialize, Serialize};

use crate::cache::CacheValue;
use crate::error::CacheError;

use super::dispatch::CommandOutcome;
use super::help::HELP_LINES;

/// Wire shape of a structured response: `{"Value": ..., "Err": ...}`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StructuredRecord {
    #[serde(rename = "Value")]
    pub value: serde_json::Value,
    #[serde(rename = "Err")]
    pub err: String,
}

impl StructuredRecord {
    pub fn ok(value: serde_json::Value) -> Self {
        Self { value, err: String::new() }
    }

    pub fn error(err: &CacheError) -> Self {
        Self { value: serde_json::Value::Null, err: err.to_string() }
    }

    /// Serializes as one newline-terminated line, the framing every
    /// structured response uses on the wire.
    pub fn to_line(&self) -> String {
        format!("{}\n", serde_json::to_string(self).unwrap_or_default())
    }
}

fn value_json(value: &Option<CacheValue>) -> serde_json::Value {
    match value {
        Some(v) => v.to_json(),
        None => serde_json::Value::Null,
    }
}

/// Renders a successful [`CommandOutcome`] as a [`StructuredRecord`]'s
/// `Value` field. The literal string `"Ok"` is reserved for the attach
/// handshake, rendered by the session layer directly rather than here.
pub fn structured_value(outcome: &CommandOutcome) -> serde_json::Value {
    match outcome {
        CommandOutcome::Get { value, .. } => value_json(value),
        CommandOutcome::Set { prior, .. } => value_json(prior),
        CommandOutcome::Update { updated, .. } => serde_json::Value::Bool(*updated),
        CommandOutcome::Remove { value, removed, .. } => {
            if *removed {
                value_json(value)
            } else {
                serde_json::Value::Null
            }
        }
        CommandOutcome::Keys { keys } => serde_json::Value::Array(
            keys.iter().cloned().map(serde_json::Value::String).collect(),
        ),
        CommandOutcome::Ttl { updated, .. } => serde_json::Value::Bool(*updated),
        CommandOutcome::Size { size } => serde_json::json!(size),
        CommandOutcome::LGet { value, .. } => match value {
            Some(v) => serde_json::Value::String(v.clone()),
            None => serde_json::Value::Null,
        },
        CommandOutcome::LAppend { .. } => serde_json::Value::Null,
        CommandOutcome::LDelete { value, .. } => serde_json::Value::String(value.clone()),
        CommandOutcome::LSize { size, .. } => serde_json::json!(size),
        CommandOutcome::DGet { value, .. } => match value {
            Some(v) => serde_json::Value::String(v.clone()),
            None => serde_json::Value::Null,
        },
        CommandOutcome::DSet { prior, .. } => match prior {
            Some(v) => serde_json::Value::String(v.clone()),
            None => serde_json::Value::Null,
        },
        CommandOutcome::DAppend { appended, .. } => serde_json::Value::Bool(*appended),
        CommandOutcome::DDelete { value, .. } => match value {
            Some(v) => serde_json::Value::String(v.clone()),
            None => serde_json::Value::Null,
        },
        CommandOutcome::DSize { size, .. } => serde_json::json!(size),
        CommandOutcome::Help | CommandOutcome::Exit => serde_json::Value::Null,
    }
}

/// Renders one outcome as the human-readable lines an interactive client
/// sees, in the phrasing of the reference implementation's
/// `UserFriendlyCacheCommands`. Each returned line is written CRLF-terminated
/// by the caller.
pub fn interactive_lines(outcome: &CommandOutcome) -> Vec<String> {
    match outcome {
        CommandOutcome::Get { key, value } => vec![match value {
            None => format!("No value for the key [{key}]"),
            Some(v) => describe_value(v),
        }],
        CommandOutcome::Set { key, value, prior } => vec![match prior {
            None => format!("New value [{value}] was set for a key [{key}]"),
            Some(p) => format!(
                "The value [{}] for the key [{key}] was replaced with a new one [{value}]",
                describe_value(p)
            ),
        }],
        CommandOutcome::Update { key, old, new, updated } => vec![if *updated {
            format!("The value [{old}] for the key [{key}] was updated with passed value [{new}]")
        } else {
            format!(
                "Cannot update value [{old}] for the key [{key}], possibly the cached value was updated already"
            )
        }],
        CommandOutcome::Remove { key, value, removed } => vec![if *removed {
            format!(
                "The value [{}] was deleted for the key [{key}]",
                value.as_ref().map(describe_value).unwrap_or_default()
            )
        } else if let Some(v) = value {
            format!(
                "The value [{}] cannot be removed for the key [{key}]. Probably the value was already updated.",
                describe_value(v)
            )
        } else {
            format!("There is no value for the key [{key}]")
        }],
        CommandOutcome::Keys { keys } => {
            const MAX_DISPLAY: usize = 20;
            let shown = keys.len().min(MAX_DISPLAY);
            let mut lines: Vec<String> = keys[..shown].to_vec();
            lines.push(format!("Count: [{}/{}]", shown, keys.len()));
            lines
        }
        CommandOutcome::Ttl { updated, .. } => vec![if *updated {
            "Ttl was updated sucessfully.".to_string()
        } else {
            "Ttl was not updated, potentially there is no value in cache anymore.".to_string()
        }],
        CommandOutcome::Size { size } => vec![size.to_string()],
        CommandOutcome::LGet { value, .. } => {
            vec![value.clone().unwrap_or_else(|| "<nil>".to_string())]
        }
        CommandOutcome::LAppend { value, .. } => vec![format!("The value [{value}] is appended.")],
        CommandOutcome::LDelete { value, .. } => vec![format!("The value [{value}] was deleted.")],
        CommandOutcome::LSize { size, .. } => vec![size.to_string()],
        CommandOutcome::DGet { value, .. } => {
            vec![value.clone().unwrap_or_else(|| "<nil>".to_string())]
        }
        CommandOutcome::DSet { prior, .. } => vec![match prior {
            None => "The dictionary pair was added sucessfully.".to_string(),
            Some(v) => format!("The value [{v}] was replaced."),
        }],
        CommandOutcome::DAppend { appended, .. } => vec![if *appended {
            "The value was appended sucessfully.".to_string()
        } else {
            "Cannot append dictionary value, potentially the value exists.".to_string()
        }],
        CommandOutcome::DDelete { value, .. } => vec![match value {
            None => "Dictionary does not contain a value for this key".to_string(),
            Some(v) => format!("The value [{v}] was deleted."),
        }],
        CommandOutcome::DSize { size, .. } => vec![size.to_string()],
        CommandOutcome::Help => HELP_LINES.iter().map(|s| s.to_string()).collect(),
        CommandOutcome::Exit => vec!["Connection closed".to_string()],
    }
}

fn describe_value(value: &CacheValue) -> String {
    match value {
        CacheValue::Scalar(s) => s.clone(),
        CacheValue::List(_) | CacheValue::Dict(_) => value.to_json().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_record_roundtrips_through_json() {
        let record = StructuredRecord::ok(serde_json::json!("v"));
        let line = record.to_line();
        assert!(line.ends_with('\n'));
        let parsed: StructuredRecord = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn error_record_has_empty_value_and_populated_err() {
        let record = StructuredRecord::error(&CacheError::BadArity);
        assert_eq!(record.value, serde_json::Value::Null);
        assert_eq!(record.err, "Wrong params count");
    }

    #[test]
    fn interactive_set_message_mentions_replacement() {
        let outcome = CommandOutcome::Set {
            key: "K".into(),
            value: "new".into(),
            prior: Some(CacheValue::Scalar("old".into())),
        };
        let lines = interactive_lines(&outcome);
        assert_eq!(
            lines[0],
            "The value [old] for the key [K] was replaced with a new one [new]"
        );
    }

    #[test]
    fn interactive_set_message_for_fresh_key() {
        let outcome = CommandOutcome::Set { key: "K".into(), value: "v".into(), prior: None };
        assert_eq!(
            interactive_lines(&outcome)[0],
            "New value [v] was set for a key [K]"
        );
    }

    #[test]
    fn interactive_keys_caps_display_and_reports_count() {
        let keys: Vec<String> = (0..30).map(|i| format!("k{i}")).collect();
        let lines = interactive_lines(&CommandOutcome::Keys { keys });
        assert_eq!(lines.len(), 21);
        assert_eq!(lines.last().unwrap(), "Count: [20/30]");
    }

    #[test]
    fn structured_keys_is_a_json_array() {
        let outcome = CommandOutcome::Keys { keys: vec!["a".into(), "b".into()] };
        assert_eq!(structured_value(&outcome), serde_json::json!(["a", "b"]));
    }
}
