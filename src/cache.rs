// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compiled expression cache using LRU eviction
//!
//! Keys are the exact source text. Every entry remembers the token registry
//! generation it was compiled against, and a lookup only answers from an
//! entry of the same generation. Compilation runs outside the lock; when two
//! threads compile the same source against the same generation, the first
//! stored tree wins and both callers get it.

use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe LRU cache of compiled trees with hit/miss statistics.
///
/// A capacity of 0 disables the cache: lookups always miss and nothing is
/// stored.
pub struct ExpressionCache<V> {
    entries: Option<Mutex<LruCache<String, Entry<V>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct Entry<V> {
    generation: u64,
    value: V,
}

/// Cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Number of lookups answered from the cache
    pub hits: u64,
    /// Number of lookups that had to compile
    pub misses: u64,
    /// Entries currently stored
    pub entries: usize,
    /// Maximum number of entries
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate hit ratio as percentage
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Combine the statistics of two caches
    pub fn merge(self, other: CacheStats) -> CacheStats {
        CacheStats {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            entries: self.entries + other.entries,
            capacity: self.capacity + other.capacity,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} entries, {} hits, {} misses ({:.1}% hit ratio)",
            self.entries,
            self.capacity,
            self.hits,
            self.misses,
            self.hit_ratio()
        )
    }
}

impl<V: Clone> ExpressionCache<V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Check if the cache stores anything at all
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Look up a tree compiled against `generation`, updating the LRU order
    /// and statistics
    pub fn get(&self, source: &str, generation: u64) -> Option<V> {
        let found = self.entries.as_ref().and_then(|entries| {
            entries
                .lock()
                .get(source)
                .filter(|entry| entry.generation == generation)
                .map(|entry| entry.value.clone())
        });
        match found {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a tree compiled against `generation`; returns the tree that ends
    /// up cached.
    ///
    /// An entry of the same generation is kept. An entry of an older
    /// generation is replaced, and a tree older than the stored entry is
    /// returned without being stored.
    pub fn insert(&self, source: &str, generation: u64, value: V) -> V {
        let Some(entries) = &self.entries else {
            return value;
        };
        let mut entries = entries.lock();
        if let Some(existing) = entries.get(source) {
            if existing.generation == generation {
                return existing.value.clone();
            }
            if existing.generation > generation {
                log::debug!("Not caching '{source}' compiled against stale generation {generation}");
                return value;
            }
        }
        entries.put(
            source.to_string(),
            Entry {
                generation,
                value: value.clone(),
            },
        );
        value
    }

    /// Return the cached tree for `source` at `generation`, compiling and
    /// storing it on a miss. Errors are returned as they are and never stored.
    pub fn get_or_compile<E>(
        &self,
        source: &str,
        generation: u64,
        compile: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(source, generation) {
            log::trace!("Cache hit for '{source}'");
            return Ok(value);
        }
        log::debug!("Cache miss for '{source}', compiling");
        let value = compile()?;
        Ok(self.insert(source, generation, value))
    }

    /// Remove every entry; statistics are kept
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }

    /// Number of entries stored
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.lock().len())
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries, 0 when disabled
    pub fn capacity(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |entries| entries.lock().cap().get())
    }

    /// Snapshot of the statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
            capacity: self.capacity(),
        }
    }
}

impl<V> fmt::Debug for ExpressionCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("enabled", &self.entries.is_some())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_get_or_compile_caches_successes() {
        let cache = ExpressionCache::new(10);
        let compiles = Cell::new(0);
        let compile = || -> Result<String, String> {
            compiles.set(compiles.get() + 1);
            Ok("tree".to_string())
        };

        assert_eq!(cache.get_or_compile("${body}", 1, compile).unwrap(), "tree");
        assert_eq!(cache.get_or_compile("${body}", 1, compile).unwrap(), "tree");
        assert_eq!(compiles.get(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_ratio(), 50.0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: ExpressionCache<String> = ExpressionCache::new(10);
        let result = cache.get_or_compile("${a", 1, || Err::<String, _>("unterminated"));
        assert_eq!(result, Err("unterminated"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ExpressionCache::new(10);
        assert_eq!(cache.insert("a", 1, 1), 1);
        assert_eq!(cache.insert("a", 1, 2), 1);
        assert_eq!(cache.get("a", 1), Some(1));
    }

    #[test]
    fn test_entries_are_scoped_to_a_generation() {
        let cache = ExpressionCache::new(10);
        assert_eq!(cache.insert("${body}", 2, "new"), "new");

        // a tree compiled before the registry changed is handed back unstored
        assert_eq!(cache.insert("${body}", 1, "old"), "old");
        assert_eq!(cache.get("${body}", 2), Some("new"));
        assert_eq!(cache.get("${body}", 1), None);

        assert_eq!(cache.insert("${body}", 3, "newer"), "newer");
        assert_eq!(cache.get("${body}", 3), Some("newer"));
        assert_eq!(cache.get("${body}", 2), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = ExpressionCache::new(2);
        cache.insert("a", 1, 1);
        cache.insert("b", 1, 2);
        cache.get("a", 1);
        cache.insert("c", 1, 3);
        assert_eq!(cache.get("b", 1), None);
        assert_eq!(cache.get("a", 1), Some(1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = ExpressionCache::new(0);
        assert!(!cache.is_enabled());
        cache.insert("a", 1, 1);
        assert_eq!(cache.get("a", 1), None);
        assert_eq!(cache.capacity(), 0);
        assert_eq!(cache.stats().misses, 1);
    }
}
