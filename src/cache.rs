//! Cache layer guarding expensive data-source calls.
//!
//! The store is an opaque key-value collaborator keyed by the canonical
//! string form of a path (see [`crate::tree::path_to_key`]). Persistent
//! stores are supplied by the hosting application and live across dispatch
//! invocations; sources that do not declare themselves cacheable get an
//! ephemeral [`MemoryStore`] instead.

use serde_json::Value;
use std::collections::HashMap;

/// Key-value contract for cache backends.
pub trait CacheStore {
    /// Cached payload for `key`, if present.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`, replacing any previous entry.
    fn set(&mut self, key: &str, value: Value);
}

/// Ephemeral, in-memory cache store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Read policy for one dispatch invocation.
///
/// Results are always written through; `bypass` only controls whether
/// cached values are read back. Options-bearing calls are assumed
/// idempotent per path+options and keep reading the cache even under
/// bypass, so expensive parameterized computations stay cacheable while
/// casual reruns without options force recomputation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy {
    /// The `nocache` flag from the dispatch options.
    pub bypass: bool,
    /// Whether a source-specific option bag is present.
    pub has_options: bool,
}

impl CachePolicy {
    /// Whether cached results are honored under this policy.
    pub fn reads(&self) -> bool {
        !self.bypass || self.has_options
    }
}
