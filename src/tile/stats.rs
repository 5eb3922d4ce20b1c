//! Cache statistics shared across threads.
//!
//! Residency state is only mutated by the cache owner, but these counters are
//! atomics so that any thread holding the `Arc` can read them while the owner
//! keeps mutating.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

/// Lock-free counters for a tile cache.
#[derive(Debug, Default)]
pub struct CacheStatistics {
    used_slots: AtomicU32,
    total_slots: AtomicU32,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    eviction_count: AtomicU64,
}

impl CacheStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn used_slots(&self) -> u32 {
        self.used_slots.load(Ordering::Relaxed)
    }

    /// Pool capacity in slots.
    pub fn total_slots(&self) -> u32 {
        self.total_slots.load(Ordering::Relaxed)
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.miss_count.load(Ordering::Relaxed)
    }

    pub fn eviction_count(&self) -> u64 {
        self.eviction_count.load(Ordering::Relaxed)
    }

    /// Take a point-in-time copy of all counters.
    ///
    /// Each field is read independently, so a snapshot taken during mutation
    /// may mix values from adjacent operations.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            used_slots: self.used_slots(),
            total_slots: self.total_slots(),
            hit_count: self.hit_count(),
            miss_count: self.miss_count(),
            eviction_count: self.eviction_count(),
        }
    }

    pub(crate) fn record_hit(&self) {
        saturating_increment(&self.hit_count);
    }

    pub(crate) fn record_miss(&self) {
        saturating_increment(&self.miss_count);
    }

    pub(crate) fn record_eviction(&self) {
        saturating_increment(&self.eviction_count);
    }

    pub(crate) fn set_used_slots(&self, used: u32) {
        self.used_slots.store(used, Ordering::Relaxed);
    }

    pub(crate) fn set_total_slots(&self, total: u32) {
        self.total_slots.store(total, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.used_slots.store(0, Ordering::Relaxed);
        self.total_slots.store(0, Ordering::Relaxed);
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
        self.eviction_count.store(0, Ordering::Relaxed);
    }
}

fn saturating_increment(counter: &AtomicU64) {
    // Err means the counter is already at u64::MAX, which is where it stays.
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_add(1));
}

/// Snapshot of cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub used_slots: u32,
    pub total_slots: u32,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
}

impl CacheStats {
    /// Hits over total lookups, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count.saturating_add(self.miss_count);
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    /// Free slots remaining.
    pub fn free_slots(&self) -> u32 {
        self.total_slots.saturating_sub(self.used_slots)
    }
}
