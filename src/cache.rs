//! Bounded in-memory cell cache with least-recently-used eviction.
//!
//! Sits between the viewport-driven orchestrator and the chunk store so
//! repeated scrolls over the same region never hit SQLite twice. Purely
//! in-memory; eviction never does I/O.

use std::collections::HashMap;

use crate::config::DEFAULT_CACHE_CAPACITY;
use crate::types::Cell;

struct CacheEntry {
    cell: Cell,
    /// Monotonic recency tick; larger = touched more recently. A counter
    /// rather than a wall clock so same-instant touches never tie.
    tick: u64,
}

/// LRU cache keyed by `(row_index, column_index)`.
///
/// Both `get` and `set` count as a touch. When an insert of a new key
/// would exceed capacity, the single entry with the smallest recency tick
/// is evicted first, so the size never exceeds capacity after any
/// operation. Eviction scans all entries; at the default capacity of
/// 5,000 that is cheap relative to a store read.
pub struct CellCache {
    entries: HashMap<(u32, u32), CacheEntry>,
    capacity: usize,
    next_tick: u64,
}

impl Default for CellCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl CellCache {
    /// Create a cache holding at most `capacity` cells.
    ///
    /// A capacity of 0 disables caching entirely.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            next_tick: 0,
        }
    }

    /// Look up a cell, updating its recency.
    pub fn get(&mut self, row_index: u32, column_index: u32) -> Option<&Cell> {
        let tick = self.bump_tick();
        let entry = self.entries.get_mut(&(row_index, column_index))?;
        entry.tick = tick;
        Some(&entry.cell)
    }

    /// Insert or overwrite a cell.
    ///
    /// Overwriting an existing key never evicts; inserting a new key at
    /// capacity evicts the globally oldest entry first.
    pub fn set(&mut self, cell: Cell) {
        if self.capacity == 0 {
            return;
        }
        let key = (cell.row_index, cell.column_index);
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_oldest();
        }
        let tick = self.bump_tick();
        self.entries.insert(key, CacheEntry { cell, tick });
    }

    /// Insert or overwrite many cells.
    pub fn set_many<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        for cell in cells {
            self.set(cell);
        }
    }

    /// Whether a cell is present. Does not touch recency.
    #[must_use]
    pub fn has(&self, row_index: u32, column_index: u32) -> bool {
        self.entries.contains_key(&(row_index, column_index))
    }

    /// Number of cached cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn bump_tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    /// Evict the entry with the smallest recency tick.
    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.tick)
            .map(|(key, _)| *key);
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn cell(row: u32, col: u32) -> Cell {
        Cell {
            row_index: row,
            column_index: col,
            value: format!("{row}-{col}"),
            is_loaded: true,
        }
    }

    #[test]
    fn test_basic_set_get() {
        let mut cache = CellCache::new(3);
        cache.set(cell(0, 0));
        cache.set(cell(0, 1));

        assert_eq!(cache.get(0, 0).unwrap().value, "0-0");
        assert_eq!(cache.get(0, 1).unwrap().value, "0-1");
        assert!(cache.get(5, 5).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_eviction_removes_oldest() {
        let mut cache = CellCache::new(2);
        cache.set(cell(0, 0));
        cache.set(cell(0, 1));
        cache.set(cell(0, 2));

        assert!(!cache.has(0, 0));
        assert!(cache.has(0, 1));
        assert!(cache.has(0, 2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_promotes_recency() {
        let mut cache = CellCache::new(2);
        cache.set(cell(0, 0));
        cache.set(cell(0, 1));
        // Touch (0,0) so (0,1) becomes the eviction candidate
        assert!(cache.get(0, 0).is_some());
        cache.set(cell(0, 2));

        assert!(cache.has(0, 0));
        assert!(!cache.has(0, 1));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut cache = CellCache::new(2);
        cache.set(cell(0, 0));
        cache.set(cell(0, 1));
        let updated = Cell {
            value: "new".into(),
            ..cell(0, 0)
        };
        cache.set(updated);

        assert_eq!(cache.len(), 2);
        assert!(cache.has(0, 1));
        assert_eq!(cache.get(0, 0).unwrap().value, "new");
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut cache = CellCache::new(100);
        cache.set_many((0..50).flat_map(|r| (0..10).map(move |c| cell(r, c))));
        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let mut cache = CellCache::new(0);
        cache.set(cell(0, 0));
        assert!(cache.is_empty());
        assert!(cache.get(0, 0).is_none());
    }

    #[test]
    fn test_clear() {
        let mut cache = CellCache::new(10);
        cache.set_many([cell(0, 0), cell(0, 1)]);
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.has(0, 0));
    }
}
