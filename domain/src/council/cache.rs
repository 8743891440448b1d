//! Bounded LRU cache of formed councils.
//!
//! Entries live in a fixed arena of slots linked into a doubly-linked
//! recency list (`head` = most recently used). A hash index maps council ids
//! to slots, and a second index maps normalised topics to council ids so a
//! repeated query can reuse its council. Insert, touch and eviction are O(1).

use super::entities::{Council, CouncilId, CouncilStatus};
use crate::core::current_timestamp;
use std::collections::HashMap;

/// Default number of councils retained.
pub const DEFAULT_COUNCIL_CACHE_CAPACITY: usize = 10;

#[derive(Debug)]
struct Slot {
    council: Council,
    last_used: u64,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct CouncilCache {
    capacity: usize,
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    index: HashMap<CouncilId, usize>,
    by_topic: HashMap<String, CouncilId>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl CouncilCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            by_topic: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &CouncilId) -> bool {
        self.index.contains_key(id)
    }

    /// Insert a council as most recently used.
    ///
    /// Replaces an existing entry with the same id. Returns the evicted
    /// least-recently-used council when the cache was full.
    pub fn insert(&mut self, council: Council) -> Option<Council> {
        if let Some(&slot) = self.index.get(&council.id) {
            self.unlink(slot);
            if let Some(entry) = self.slots[slot].as_mut() {
                self.by_topic.remove(&Council::topic_key(&entry.council.topic));
                entry.council = council;
                entry.last_used = current_timestamp();
            }
            self.push_front(slot);
            self.reindex_topic(slot);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let id = council.id.clone();
        let entry = Slot {
            council,
            last_used: current_timestamp(),
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        self.push_front(slot);
        self.reindex_topic(slot);

        evicted
    }

    /// Read a council without changing its recency.
    pub fn get(&self, id: &CouncilId) -> Option<&Council> {
        self.index
            .get(id)
            .and_then(|&slot| self.slots[slot].as_ref())
            .map(|entry| &entry.council)
    }

    /// Mark a council as used now and return it.
    pub fn touch(&mut self, id: &CouncilId) -> Option<&Council> {
        let slot = *self.index.get(id)?;
        self.unlink(slot);
        self.push_front(slot);
        let entry = self.slots[slot].as_mut()?;
        entry.last_used = current_timestamp();
        Some(&entry.council)
    }

    /// Active council previously formed for the same topic, if cached.
    pub fn find_by_topic(&self, topic: &str) -> Option<&Council> {
        self.by_topic
            .get(&Council::topic_key(topic))
            .and_then(|id| self.get(id))
            .filter(|c| c.is_active())
    }

    pub fn set_status(&mut self, id: &CouncilId, status: CouncilStatus) -> bool {
        match self.index.get(id).and_then(|&slot| self.slots[slot].as_mut()) {
            Some(entry) => {
                entry.council.status = status;
                true
            }
            None => false,
        }
    }

    /// Last-used timestamp (ms since epoch) for a cached council.
    pub fn last_used(&self, id: &CouncilId) -> Option<u64> {
        self.index
            .get(id)
            .and_then(|&slot| self.slots[slot].as_ref())
            .map(|entry| entry.last_used)
    }

    pub fn remove(&mut self, id: &CouncilId) -> Option<Council> {
        let slot = self.index.remove(id)?;
        self.unlink(slot);
        let entry = self.slots[slot].take()?;
        self.free.push(slot);
        let key = Council::topic_key(&entry.council.topic);
        if self.by_topic.get(&key) == Some(id) {
            self.by_topic.remove(&key);
        }
        Some(entry.council)
    }

    /// Council ids from most to least recently used.
    pub fn ids_by_recency(&self) -> Vec<CouncilId> {
        let mut ids = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            match self.slots[slot].as_ref() {
                Some(entry) => {
                    ids.push(entry.council.id.clone());
                    cursor = entry.next;
                }
                None => break,
            }
        }
        ids
    }

    fn evict_lru(&mut self) -> Option<Council> {
        let tail = self.tail?;
        let id = self.slots[tail].as_ref()?.council.id.clone();
        self.remove(&id)
    }

    fn reindex_topic(&mut self, slot: usize) {
        if let Some(entry) = self.slots[slot].as_ref() {
            self.by_topic.insert(
                Council::topic_key(&entry.council.topic),
                entry.council.id.clone(),
            );
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.slots[slot].as_ref() {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(entry) = self.slots[p].as_mut() {
                    entry.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(entry) = self.slots[n].as_mut() {
                    entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(entry) = self.slots[slot].as_mut() {
            entry.prev = None;
            entry.next = None;
        }
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(entry) = self.slots[slot].as_mut() {
            entry.prev = None;
            entry.next = old_head;
        }
        if let Some(h) = old_head
            && let Some(entry) = self.slots[h].as_mut()
        {
            entry.prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}

impl Default for CouncilCache {
    fn default() -> Self {
        Self::new(DEFAULT_COUNCIL_CACHE_CAPACITY)
    }
}
