//! The cache core: value containers, a timestamped TTL-bearing entry, a
//! per-namespace concurrent store, and a process-wide namespace registry.

pub mod entry;
pub mod registry;
pub mod store;
pub mod value;

pub use registry::NamespaceRegistry;
pub use store::{CacheStore, NO_TTL};
pub use value::{CacheValue, DictValue, ListValue};
