//! LRU List Module
//!
//! Implements the recency order for LRU eviction as a slab-backed
//! doubly-linked list, so touch, remove and eviction are all O(1).

use crate::cache::CacheEntry;

// == LRU List ==
/// Tracks access order for LRU eviction strategy.
///
/// Entries live in slots addressed by index:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Freed slots are recycled, so an index stays valid until its entry is removed.
#[derive(Debug)]
pub struct LruList<K, V> {
    /// Entry slots, `None` when free
    slots: Vec<Option<CacheEntry<K, V>>>,
    /// Indices of free slots
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<K, V> LruList<K, V> {
    // == Constructor ==
    /// Creates a new empty LRU list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new empty LRU list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a new entry as most recently used and returns its slot index.
    pub fn push_front(&mut self, key: K, value: V) -> usize {
        let entry = CacheEntry::new(key, value);
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };

        self.link_front(idx);
        self.len += 1;
        idx
    }

    // == Touch ==
    /// Marks a slot as recently used (moves to front).
    ///
    /// Unknown or free slots are ignored.
    pub fn touch(&mut self, idx: usize) {
        if self.head == Some(idx) || self.get(idx).is_none() {
            return;
        }

        self.unlink(idx);
        self.link_front(idx);
    }

    // == Remove ==
    /// Removes the entry at `idx` and frees its slot.
    pub fn remove(&mut self, idx: usize) -> Option<CacheEntry<K, V>> {
        self.get(idx)?;

        self.unlink(idx);
        let entry = self.slots[idx].take();
        self.free.push(idx);
        self.len -= 1;
        entry
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<CacheEntry<K, V>> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Peek Oldest ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_back(&self) -> Option<&CacheEntry<K, V>> {
        self.tail.and_then(|idx| self.get(idx))
    }

    // == Accessors ==
    pub fn get(&self, idx: usize) -> Option<&CacheEntry<K, V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut CacheEntry<K, V>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Length ==
    /// Returns the number of linked entries.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every entry and forgets all slots.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Linking ==
    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;

        if let Some(entry) = self.slots[idx].as_mut() {
            entry.prev = None;
            entry.next = old_head;
        }

        if let Some(head_idx) = old_head {
            if let Some(head) = self.slots[head_idx].as_mut() {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.get(idx) {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_entry) = self.slots[prev_idx].as_mut() {
                    prev_entry.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_entry) = self.slots[next_idx].as_mut() {
                    next_entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(entry) = self.slots[idx].as_mut() {
            entry.prev = None;
            entry.next = None;
        }
    }
}

impl<K, V> Default for LruList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Iterator ==
/// Iterator over entries, most recently used first.
pub struct Iter<'a, K, V> {
    list: &'a LruList<K, V>,
    cursor: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a CacheEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.list.get(self.cursor?)?;
        self.cursor = entry.next;
        Some(entry)
    }
}
