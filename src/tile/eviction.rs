//! LRU ordering of occupied slots.
//!
//! The queue is an intrusive doubly-linked list laid out in two arrays indexed
//! by physical slot (`prev` and `next`). Promote, remove and pop are O(1) and
//! never allocate after construction.

use super::pool::SlotIndex;

/// Null link.
const NIL: u32 = u32::MAX;

/// Least-recently-used order over physical slots.
///
/// The head is the least recently used slot, the tail the most recently used.
#[derive(Debug, Clone)]
pub struct EvictionQueue {
    prev: Vec<u32>,
    next: Vec<u32>,
    linked: Vec<bool>,
    head: u32,
    tail: u32,
    len: usize,
}

impl EvictionQueue {
    /// Create an empty queue able to hold slots `0..capacity`.
    pub fn with_capacity(capacity: u32) -> Self {
        let n = capacity as usize;
        Self {
            prev: vec![NIL; n],
            next: vec![NIL; n],
            linked: vec![false; n],
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    /// Number of slots the queue can address.
    pub fn capacity(&self) -> u32 {
        self.linked.len() as u32
    }

    /// Number of queued slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `slot` is queued.
    pub fn contains(&self, slot: SlotIndex) -> bool {
        self.linked.get(slot.as_usize()).copied().unwrap_or(false)
    }

    /// Move `slot` to the most-recently-used end, inserting it if absent.
    ///
    /// Out-of-range slots are ignored.
    pub fn promote(&mut self, slot: SlotIndex) {
        let i = slot.get();
        if i as usize >= self.linked.len() {
            return;
        }
        if self.linked[i as usize] {
            if self.tail == i {
                return;
            }
            self.unlink(i);
        }
        self.link_tail(i);
    }

    /// Remove `slot` from the queue. Returns whether it was queued.
    pub fn remove(&mut self, slot: SlotIndex) -> bool {
        if !self.contains(slot) {
            return false;
        }
        self.unlink(slot.get());
        true
    }

    /// The least recently used slot, without removing it.
    pub fn peek_lru(&self) -> Option<SlotIndex> {
        (self.head != NIL).then(|| SlotIndex::new(self.head))
    }

    /// Remove and return the least recently used slot.
    pub fn pop_lru(&mut self) -> Option<SlotIndex> {
        let head = self.peek_lru()?;
        self.unlink(head.get());
        Some(head)
    }

    /// Iterate from least to most recently used.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            queue: self,
            cursor: self.head,
        }
    }

    /// Empty the queue and shrink it to zero slots.
    pub fn clear(&mut self) {
        self.prev.clear();
        self.next.clear();
        self.linked.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }

    fn link_tail(&mut self, i: u32) {
        let idx = i as usize;
        self.prev[idx] = self.tail;
        self.next[idx] = NIL;
        if self.tail == NIL {
            self.head = i;
        } else {
            self.next[self.tail as usize] = i;
        }
        self.tail = i;
        self.linked[idx] = true;
        self.len += 1;
    }

    fn unlink(&mut self, i: u32) {
        let idx = i as usize;
        let (prev, next) = (self.prev[idx], self.next[idx]);

        if prev == NIL {
            self.head = next;
        } else {
            self.next[prev as usize] = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.prev[next as usize] = prev;
        }

        self.prev[idx] = NIL;
        self.next[idx] = NIL;
        self.linked[idx] = false;
        self.len -= 1;
    }
}

/// Iterator over queued slots, least recently used first.
pub struct Iter<'a> {
    queue: &'a EvictionQueue,
    cursor: u32,
}

impl Iterator for Iter<'_> {
    type Item = SlotIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let current = self.cursor;
        self.cursor = self.queue.next[current as usize];
        Some(SlotIndex::new(current))
    }
}
