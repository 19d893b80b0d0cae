//! Concurrent, TTL-aware key/value store for a single namespace.
//!
//! All public operations take the key map's single exclusive region for
//! their whole duration — the same coarse-grained, always-exclusive locking
//! the reference implementation uses (it locks even on reads). Sharded
//! striping would reduce contention but isn't required for this design: a
//! cache server is expected to be bound by network I/O and per-entry work,
//! not by map contention.
//!
//! Expiry is lazy: nothing proactively sweeps expired entries. Every read
//! path that observes an expired entry removes it before returning absent.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::entry::CacheEntry;
use super::value::{CacheValue, DictValue, ListValue};

pub const NO_TTL: Duration = Duration::ZERO;

#[derive(Default)]
pub struct CacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CacheValue> {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        match map.get(key) {
            Some(entry) if entry.is_expired(now) => {
                map.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    pub fn put(&self, key: &str, value: CacheValue) -> Option<CacheValue> {
        self.put_expirable(key, value, NO_TTL)
    }

    pub fn put_expirable(&self, key: &str, value: CacheValue, ttl: Duration) -> Option<CacheValue> {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        let prior = map.insert(key.to_string(), CacheEntry::new(value, ttl));
        prior.filter(|e| !e.is_expired(now)).map(|e| e.value)
    }

    pub fn put_if_absent(&self, key: &str, value: CacheValue) -> Option<CacheValue> {
        self.put_expirable_if_absent(key, value, NO_TTL)
    }

    pub fn put_expirable_if_absent(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Duration,
    ) -> Option<CacheValue> {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        match map.get(key) {
            Some(existing) if !existing.is_expired(now) => Some(existing.value.clone()),
            _ => {
                map.insert(key.to_string(), CacheEntry::new(value, ttl));
                None
            }
        }
    }

    pub fn remove(&self, key: &str) -> Option<CacheValue> {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        let removed = map.remove(key)?;
        if removed.is_expired(now) {
            None
        } else {
            Some(removed.value)
        }
    }

    pub fn remove_pair(&self, key: &str, value: &CacheValue) -> bool {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        match map.get(key) {
            Some(existing) if existing.is_expired(now) => {
                map.remove(key);
                false
            }
            Some(existing) if &existing.value == value => {
                map.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn replace(&self, key: &str, value: CacheValue) -> Option<CacheValue> {
        self.replace_expirable(key, value, NO_TTL)
    }

    pub fn replace_expirable(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Duration,
    ) -> Option<CacheValue> {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        match map.get(key) {
            Some(existing) if existing.is_expired(now) => {
                map.remove(key);
                None
            }
            Some(existing) => {
                let prior = existing.value.clone();
                map.insert(key.to_string(), CacheEntry::new(value, ttl));
                Some(prior)
            }
            None => None,
        }
    }

    /// CAS replace that preserves the entry's existing ttl.
    pub fn replace_value(&self, key: &str, old: &CacheValue, new: CacheValue) -> bool {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        match map.get(key) {
            Some(existing) if existing.is_expired(now) => {
                map.remove(key);
                false
            }
            Some(existing) if &existing.value == old => {
                let ttl = existing.ttl();
                map.insert(key.to_string(), CacheEntry::new(new, ttl));
                true
            }
            _ => false,
        }
    }

    pub fn replace_value_expirable(
        &self,
        key: &str,
        old: &CacheValue,
        new: CacheValue,
        ttl: Duration,
    ) -> bool {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        match map.get(key) {
            Some(existing) if existing.is_expired(now) => {
                map.remove(key);
                false
            }
            Some(existing) if &existing.value == old => {
                map.insert(key.to_string(), CacheEntry::new(new, ttl));
                true
            }
            _ => false,
        }
    }

    /// Rewrites ttl in place without touching stored_at. If the new ttl
    /// leaves the entry already expired it is removed; the call still
    /// reports success, matching the reference implementation.
    pub fn update_ttl(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        let Some(entry) = map.get_mut(key) else {
            return false;
        };
        if entry.is_expired(now) {
            map.remove(key);
            return false;
        }
        entry.set_ttl(ttl);
        if entry.is_expired(now) {
            map.remove(key);
        }
        true
    }

    /// Snapshot of live (non-expired) keys. Expired entries encountered are
    /// dropped as a side effect, same as every other read path.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap();
        let expired: Vec<String> = map
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in &expired {
            map.remove(k);
        }
        map.keys().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Gets the value at `key` as a list, auto-creating a one-element list
    /// if absent, then appending `value` — retrying if a concurrent writer
    /// won the creation race, mirroring `AppendListValue` in the reference
    /// implementation.
    pub fn append_list(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> crate::error::Result<()> {
        loop {
            match self.get(key) {
                None => {
                    let list = ListValue::new(value.clone());
                    if self
                        .put_expirable_if_absent(key, CacheValue::List(list), ttl)
                        .is_none()
                    {
                        return Ok(());
                    }
                    // lost the race; retry
                }
                Some(existing) => {
                    let list = existing.as_list(key)?;
                    list.append(value);
                    return Ok(());
                }
            }
        }
    }

    /// Sets a dict entry, auto-creating the dict if absent, returning the
    /// prior value for that dict key if any.
    pub fn set_dict(
        &self,
        key: &str,
        dict_key: String,
        value: String,
    ) -> crate::error::Result<Option<String>> {
        loop {
            match self.get(key) {
                None => {
                    let dict = DictValue::with_entry(dict_key.clone(), value.clone());
                    if self
                        .put_if_absent(key, CacheValue::Dict(dict))
                        .is_none()
                    {
                        return Ok(None);
                    }
                }
                Some(existing) => {
                    let dict = existing.as_dict(key)?;
                    return Ok(dict.put(dict_key, value));
                }
            }
        }
    }

    /// Inserts a dict entry only if absent, auto-creating the dict if
    /// absent. Returns whether the insert happened.
    pub fn append_dict(
        &self,
        key: &str,
        dict_key: String,
        value: String,
    ) -> crate::error::Result<bool> {
        loop {
            match self.get(key) {
                None => {
                    let dict = DictValue::with_entry(dict_key.clone(), value.clone());
                    if self
                        .put_if_absent(key, CacheValue::Dict(dict))
                        .is_none()
                    {
                        return Ok(true);
                    }
                }
                Some(existing) => {
                    let dict = existing.as_dict(key)?;
                    return Ok(dict.put_if_absent(dict_key, value).is_none());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scalar(s: &str) -> CacheValue {
        CacheValue::Scalar(s.to_string())
    }

    #[test]
    fn get_on_missing_key_is_none() {
        let store = CacheStore::new();
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn put_then_get_roundtrips() {
        let store = CacheStore::new();
        assert!(store.put("k", scalar("v")).is_none());
        assert_eq!(store.get("k"), Some(scalar("v")));
    }

    #[test]
    fn put_returns_prior_value() {
        let store = CacheStore::new();
        store.put("k", scalar("v1"));
        assert_eq!(store.put("k", scalar("v2")), Some(scalar("v1")));
    }

    #[test]
    fn expired_entry_is_absent_and_removed_lazily() {
        let store = CacheStore::new();
        store.put_expirable("k", scalar("v"), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(15));
        assert!(store.get("k").is_none());
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn put_if_absent_only_inserts_once() {
        let store = CacheStore::new();
        assert_eq!(store.put_if_absent("k", scalar("v1")), None);
        assert_eq!(store.put_if_absent("k", scalar("v2")), Some(scalar("v1")));
        assert_eq!(store.get("k"), Some(scalar("v1")));
    }

    #[test]
    fn remove_returns_prior_value_and_clears_entry() {
        let store = CacheStore::new();
        store.put("k", scalar("v"));
        assert_eq!(store.remove("k"), Some(scalar("v")));
        assert!(store.get("k").is_none());
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn remove_pair_requires_matching_value() {
        let store = CacheStore::new();
        store.put("k", scalar("v"));
        assert!(!store.remove_pair("k", &scalar("other")));
        assert!(store.remove_pair("k", &scalar("v")));
        assert!(store.get("k").is_none());
    }

    #[test]
    fn replace_value_succeeds_only_when_current_matches_old() {
        let store = CacheStore::new();
        store.put_expirable("k", scalar("a"), Duration::from_secs(100));
        assert!(!store.replace_value("k", &scalar("wrong"), scalar("b")));
        assert!(store.replace_value("k", &scalar("a"), scalar("b")));
        assert_eq!(store.get("k"), Some(scalar("b")));
    }

    #[test]
    fn replace_value_preserves_existing_ttl() {
        let store = CacheStore::new();
        store.put_expirable("k", scalar("a"), Duration::from_millis(20));
        assert!(store.replace_value("k", &scalar("a"), scalar("b")));
        std::thread::sleep(Duration::from_millis(30));
        assert!(store.get("k").is_none(), "ttl should have carried over");
    }

    #[test]
    fn update_ttl_zero_never_expires() {
        // A ttl of zero is the "no expiry" sentinel (same convention as
        // CacheEntry::new), not an instruction to expire immediately.
        let store = CacheStore::new();
        store.put_expirable("k", scalar("v"), Duration::from_millis(5));
        assert!(store.update_ttl("k", Duration::ZERO));
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(store.get("k"), Some(scalar("v")));
    }

    #[test]
    fn update_ttl_to_an_already_elapsed_duration_removes_entry() {
        let store = CacheStore::new();
        store.put("k", scalar("v"));
        assert!(store.update_ttl("k", Duration::from_nanos(1)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get("k").is_none());
    }

    #[test]
    fn update_ttl_on_missing_key_returns_false() {
        let store = CacheStore::new();
        assert!(!store.update_ttl("missing", Duration::from_secs(1)));
    }

    #[test]
    fn keys_excludes_expired_entries() {
        let store = CacheStore::new();
        store.put("alive", scalar("v"));
        store.put_expirable("dying", scalar("v"), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(15));
        let keys = store.keys();
        assert_eq!(keys, vec!["alive".to_string()]);
    }

    #[test]
    fn append_list_auto_creates_then_appends() {
        let store = CacheStore::new();
        store.append_list("l", "a".into(), NO_TTL).unwrap();
        store.append_list("l", "b".into(), NO_TTL).unwrap();
        let value = store.get("l").unwrap();
        let list = value.as_list("l").unwrap();
        assert_eq!(list.size(), 2);
        assert_eq!(list.get(0).unwrap(), "a");
        assert_eq!(list.get(1).unwrap(), "b");
    }

    #[test]
    fn append_list_on_scalar_is_type_mismatch() {
        let store = CacheStore::new();
        store.put("k", scalar("x"));
        assert!(store.append_list("k", "a".into(), NO_TTL).is_err());
    }

    #[test]
    fn set_dict_auto_creates_then_overwrites() {
        let store = CacheStore::new();
        assert_eq!(store.set_dict("d", "f".into(), "1".into()).unwrap(), None);
        assert_eq!(
            store.set_dict("d", "f".into(), "2".into()).unwrap(),
            Some("1".to_string())
        );
    }

    #[test]
    fn append_dict_only_inserts_when_absent() {
        let store = CacheStore::new();
        assert!(store.append_dict("d", "f".into(), "1".into()).unwrap());
        assert!(!store.append_dict("d", "f".into(), "2".into()).unwrap());
    }

    #[test]
    fn dget_on_scalar_is_type_mismatch() {
        let store = CacheStore::new();
        store.put("k", scalar("x"));
        let value = store.get("k").unwrap();
        assert!(value.as_dict("k").is_err());
    }
}
