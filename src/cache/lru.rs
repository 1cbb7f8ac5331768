//! Arena-backed LRU cache.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

/// Slot of the head sentinel. The node after it is the least recently used.
const HEAD: usize = 0;

/// Slot of the tail sentinel. The node before it is the most recently used.
const TAIL: usize = 1;

/// Errors raised by the cache itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),
}

/// One arena slot.
///
/// Sentinels and free slots have no entry. Links are slot indices.
#[derive(Debug)]
struct Slot<K, V> {
    entry: Option<(K, V)>,
    prev: usize,
    next: usize,
}

impl<K, V> Slot<K, V> {
    fn vacant() -> Self {
        Self {
            entry: None,
            prev: HEAD,
            next: TAIL,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Number of `get` hits.
    pub hits: u64,

    /// Number of `get` misses.
    pub misses: u64,

    /// Entries dropped to make room for a new key.
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Fixed-capacity least-recently-used cache.
///
/// Entries live in a `Vec` of slots linked by index into a doubly linked
/// list running from the head sentinel (least recent) to the tail sentinel
/// (most recent). A `HashMap` maps each key to its slot, so lookups,
/// promotions, insertions and evictions are all O(1).
pub struct LruCache<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .field("evictions", &self.evictions)
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        let mut slots = Vec::with_capacity(capacity + 2);
        slots.push(Slot::vacant());
        slots.push(Slot::vacant());

        Ok(Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            slots,
            free: Vec::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
        })
    }

    /// Maximum number of resident entries, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident entries, never more than [`capacity`](Self::capacity).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no entry is resident.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Membership test that leaves the recency order and statistics alone.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Looks up `key` and promotes it to most recently used.
    ///
    /// A miss leaves both the contents and the recency order untouched.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&slot) = self.index.get(key) else {
            self.misses += 1;
            return None;
        };

        self.hits += 1;
        self.unlink(slot);
        self.attach_mru(slot);
        self.slots[slot].entry.as_ref().map(|(_, value)| value)
    }

    /// Reads `key` without touching the recency order or the statistics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &slot = self.index.get(key)?;
        self.slots[slot].entry.as_ref().map(|(_, value)| value)
    }

    /// Inserts or replaces `key`, making it the most recently used entry.
    ///
    /// Replacing an existing key never changes the number of entries. When a
    /// new key arrives at capacity, the least recently used entry is evicted
    /// first and handed back to the caller.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            self.unlink(slot);
            if let Some((_, stored)) = self.slots[slot].entry.as_mut() {
                *stored = value;
            }
            self.attach_mru(slot);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let slot = self.alloc(key.clone(), value);
        self.attach_mru(slot);
        self.index.insert(key, slot);

        evicted
    }

    /// Removes `key` explicitly, returning its value if it was resident.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        self.release(slot).map(|(_, value)| value)
    }

    /// Evicts the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let slot = self.slots[HEAD].next;
        if slot == TAIL {
            return None;
        }

        let (key, value) = self.release(slot)?;
        self.index.remove(&key);
        self.evictions += 1;

        tracing::debug!(
            slot,
            len = self.index.len(),
            capacity = self.capacity,
            "evicted least recently used entry"
        );

        Some((key, value))
    }

    /// Drops every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.index.clear();
        self.free.clear();
        self.slots.truncate(2);
        self.slots[HEAD].next = TAIL;
        self.slots[TAIL].prev = HEAD;
    }

    /// Entries from least to most recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.slots[HEAD].next,
            remaining: self.index.len(),
        }
    }

    /// Keys from least to most recently used.
    ///
    /// Every call walks the current order afresh; nothing is mutated.
    pub fn keys_in_order(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Snapshot of the current size and the hit, miss and eviction counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.index.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }

    fn alloc(&mut self, key: K, value: V) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot].entry = Some((key, value));
                slot
            }
            None => {
                let mut fresh = Slot::vacant();
                fresh.entry = Some((key, value));
                self.slots.push(fresh);
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) -> Option<(K, V)> {
        self.unlink(slot);
        let entry = self.slots[slot].entry.take();
        self.free.push(slot);
        entry
    }

    /// Splices `slot` out by joining its neighbours. Its own links go stale.
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.slots[slot].prev, self.slots[slot].next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }

    /// Splices `slot` in just before the tail sentinel.
    fn attach_mru(&mut self, slot: usize) {
        let last = self.slots[TAIL].prev;
        self.slots[slot].prev = last;
        self.slots[slot].next = TAIL;
        self.slots[last].next = slot;
        self.slots[TAIL].prev = slot;
    }
}

/// Renders the keys in recency order, e.g. `[4, 1, 2, 5]`.
impl<K: Hash + Eq + Clone + fmt::Debug, V> fmt::Display for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys_in_order()).finish()
    }
}

/// Iterator over `(key, value)` pairs, least recently used first.
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == TAIL {
            return None;
        }

        let slots = self.slots;
        let slot = &slots[self.cursor];
        self.cursor = slot.next;
        self.remaining = self.remaining.saturating_sub(1);
        slot.entry.as_ref().map(|(key, value)| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
