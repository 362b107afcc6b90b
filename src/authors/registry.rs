//! First-write-wins author registry.
//!
//! The registry only ever grows. [`AuthorRegistry::insert_if_absent`]
//! returns `true` for exactly one call per distinct identifier, however
//! many threads race on it, and that signal is what drives the
//! write-once side effect in the extractor.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of independently locked buckets.
const SHARD_COUNT: usize = 16;

/// Concurrent set of author identifiers.
///
/// Identifiers are spread over [`SHARD_COUNT`] mutex-guarded sets by hash.
/// Inserts of the same identifier always contend on the same lock, while
/// inserts of different identifiers usually do not.
#[derive(Debug)]
pub struct AuthorRegistry {
    shards: [Mutex<HashSet<String>>; SHARD_COUNT],
}

impl Default for AuthorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| Mutex::new(HashSet::new())),
        }
    }

    /// Insert `identifier` unless it is already present.
    ///
    /// Returns `true` only for the call that performed the insertion.
    pub fn insert_if_absent(&self, identifier: &str) -> bool {
        let mut shard = self.lock(identifier);
        if shard.contains(identifier) {
            return false;
        }
        shard.insert(identifier.to_string())
    }

    /// Whether `identifier` has been seen.
    pub fn contains(&self, identifier: &str) -> bool {
        self.lock(identifier).contains(identifier)
    }

    /// Number of distinct identifiers seen so far.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Whether no identifier has been seen.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self, identifier: &str) -> MutexGuard<'_, HashSet<String>> {
        let mut hasher = DefaultHasher::new();
        identifier.hash(&mut hasher);
        let index = (hasher.finish() % SHARD_COUNT as u64) as usize;
        // A set of owned strings is never left half-updated by a panic,
        // so a poisoned shard is still consistent.
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
