//! Cache value variants.
//!
//! A stored value is either a plain scalar string or a shared-owner handle
//! to a list or dictionary. List and dictionary handles are cheaply
//! cloneable (`Arc`-backed) so a reference returned while the store's own
//! lock is held remains valid after that lock is released.

use std::sync::{Arc, Mutex};

use crate::error::{CacheError, Result};

/// A value held in a [`crate::cache::CacheStore`] entry.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Scalar(String),
    List(ListValue),
    Dict(DictValue),
}

impl CacheValue {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Scalar(_) => "scalar",
            CacheValue::List(_) => "list",
            CacheValue::Dict(_) => "dictionary",
        }
    }

    pub fn as_list(&self, key: &str) -> Result<&ListValue> {
        match self {
            CacheValue::List(l) => Ok(l),
            _ => Err(CacheError::TypeMismatch {
                key: key.to_string(),
                expected: "list",
            }),
        }
    }

    pub fn as_dict(&self, key: &str) -> Result<&DictValue> {
        match self {
            CacheValue::Dict(d) => Ok(d),
            _ => Err(CacheError::TypeMismatch {
                key: key.to_string(),
                expected: "dictionary",
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CacheValue::Scalar(s) => serde_json::Value::String(s.clone()),
            CacheValue::List(l) => l.to_json(),
            CacheValue::Dict(d) => d.to_json(),
        }
    }
}

/// Identity comparison used by CAS operations: string equality for scalars,
/// reference identity for containers (replacing a container by value has no
/// well-defined meaning here).
impl PartialEq for CacheValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CacheValue::Scalar(a), CacheValue::Scalar(b)) => a == b,
            (CacheValue::List(a), CacheValue::List(b)) => Arc::ptr_eq(&a.0, &b.0),
            (CacheValue::Dict(a), CacheValue::Dict(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

/// An ordered, mutable, concurrency-safe list of scalar values.
#[derive(Debug, Clone)]
pub struct ListValue(Arc<Mutex<Vec<String>>>);

impl ListValue {
    pub fn new(first: String) -> Self {
        Self(Arc::new(Mutex::new(vec![first])))
    }

    pub fn empty() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn get(&self, index: i64) -> Result<String> {
        let slice = self.0.lock().unwrap();
        let i = valid_index(index, slice.len()).ok_or(CacheError::OutOfBounds)?;
        Ok(slice[i].clone())
    }

    pub fn remove(&self, index: i64) -> Result<String> {
        let mut slice = self.0.lock().unwrap();
        let i = valid_index(index, slice.len()).ok_or(CacheError::OutOfBounds)?;
        Ok(slice.remove(i))
    }

    pub fn append(&self, value: String) {
        self.0.lock().unwrap().push(value);
    }

    pub fn size(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    fn to_json(&self) -> serde_json::Value {
        let slice = self.0.lock().unwrap();
        serde_json::Value::Array(
            slice
                .iter()
                .map(|s| serde_json::Value::String(s.clone()))
                .collect(),
        )
    }
}

fn valid_index(index: i64, len: usize) -> Option<usize> {
    if index < 0 || index as usize >= len {
        None
    } else {
        Some(index as usize)
    }
}

/// A string-keyed, mutable, concurrency-safe dictionary of scalar values.
#[derive(Debug, Clone)]
pub struct DictValue(Arc<Mutex<std::collections::HashMap<String, String>>>);

impl DictValue {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(std::collections::HashMap::new())))
    }

    pub fn with_entry(key: String, value: String) -> Self {
        let dict = Self::new();
        dict.put(key, value);
        dict
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }

    /// Sets `key` to `value`, returning the value it replaced, if any.
    pub fn put(&self, key: String, value: String) -> Option<String> {
        self.0.lock().unwrap().insert(key, value)
    }

    /// Sets `key` to `value` only if absent. Returns `None` on success,
    /// or the existing value if the key was already present.
    pub fn put_if_absent(&self, key: String, value: String) -> Option<String> {
        let mut map = self.0.lock().unwrap();
        if let Some(existing) = map.get(&key) {
            return Some(existing.clone());
        }
        map.insert(key, value);
        None
    }

    /// Replaces the value for `key`, returning the prior value. A no-op
    /// (returning `None`) when the key is absent.
    pub fn replace(&self, key: &str, value: String) -> Option<String> {
        let mut map = self.0.lock().unwrap();
        if !map.contains_key(key) {
            return None;
        }
        map.insert(key.to_string(), value)
    }

    /// CAS replace: succeeds iff the current value for `key` equals `old`.
    pub fn replace_value(&self, key: &str, old: &str, new: String) -> bool {
        let mut map = self.0.lock().unwrap();
        match map.get(key) {
            Some(current) if current == old => {
                map.insert(key.to_string(), new);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().remove(key)
    }

    /// CAS remove: succeeds iff the current value for `key` equals `value`.
    pub fn remove_pair(&self, key: &str, value: &str) -> bool {
        let mut map = self.0.lock().unwrap();
        match map.get(key) {
            Some(current) if current == value => {
                map.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.lock().unwrap().keys().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    fn to_json(&self) -> serde_json::Value {
        let map = self.0.lock().unwrap();
        serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

impl Default for DictValue {
    fn default() -> Self {
        Self::new()
    }
}
