//! Process-wide registry of per-namespace cache stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::store::CacheStore;

/// Maps a namespace id to its [`CacheStore`]. Namespaces are created on
/// first reference and live for the lifetime of the process; there is no
/// deletion.
#[derive(Default)]
pub struct NamespaceRegistry {
    stores: Mutex<HashMap<String, Arc<CacheStore>>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store for `namespace`, creating it if this is the first
    /// reference. Concurrent first-references race to create; exactly one
    /// creation wins and all callers observe the same store afterward.
    pub fn attach(&self, namespace: &str) -> Arc<CacheStore> {
        let mut stores = self.stores.lock().unwrap();
        stores
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(CacheStore::new()))
            .clone()
    }

    pub fn namespace_count(&self) -> usize {
        self.stores.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_creates_on_first_reference() {
        let registry = NamespaceRegistry::new();
        assert_eq!(registry.namespace_count(), 0);
        registry.attach("default");
        assert_eq!(registry.namespace_count(), 1);
    }

    #[test]
    fn attach_returns_same_store_for_repeated_calls() {
        let registry = NamespaceRegistry::new();
        let a = registry.attach("default");
        let b = registry.attach("default");
        a.put("k", crate::cache::value::CacheValue::Scalar("v".into()));
        assert_eq!(
            b.get("k"),
            Some(crate::cache::value::CacheValue::Scalar("v".into()))
        );
    }

    #[test]
    fn distinct_namespaces_are_isolated() {
        let registry = NamespaceRegistry::new();
        let a = registry.attach("a");
        let b = registry.attach("b");
        a.put("k", crate::cache::value::CacheValue::Scalar("in-a".into()));
        assert!(b.get("k").is_none());
    }
}
