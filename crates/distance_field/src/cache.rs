//! Field reuse keyed by build fingerprints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::pipeline::DistanceField;

/// Store for finished fields, keyed by the build fingerprint.
///
/// Concurrent callers may both miss and build the same key; each build
/// is correct on its own and the last writer wins, so the race only
/// costs time.
pub trait FieldCache: Send + Sync {
  fn get(&self, fingerprint: &str) -> Option<DistanceField>;
  fn put(&self, fingerprint: &str, field: &DistanceField);
}

/// Process-wide in-memory cache. Cloning the handle shares the store.
///
/// Entries are never evicted; eviction policy belongs to the caller.
#[derive(Clone, Default)]
pub struct MemoryCache {
  entries: Arc<Mutex<HashMap<String, DistanceField>>>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.lock().map(|map| map.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl FieldCache for MemoryCache {
  fn get(&self, fingerprint: &str) -> Option<DistanceField> {
    // A poisoned lock counts as a miss; the field gets rebuilt.
    match self.entries.lock() {
      Ok(map) => map.get(fingerprint).cloned(),
      Err(_) => None,
    }
  }

  fn put(&self, fingerprint: &str, field: &DistanceField) {
    if let Ok(mut map) = self.entries.lock() {
      map.insert(fingerprint.to_owned(), field.clone());
    }
  }
}

/// Cache that stores nothing; every build runs.
#[derive(Clone, Copy, Default)]
pub struct NoCache;

impl FieldCache for NoCache {
  fn get(&self, _fingerprint: &str) -> Option<DistanceField> {
    None
  }

  fn put(&self, _fingerprint: &str, _field: &DistanceField) {}
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;
