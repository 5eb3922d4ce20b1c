//! Tile-residency cache over a fixed slot pool.
//!
//! The cache maps logical tiles to physical slots of a [`SlotStore`], evicting
//! the least recently used tile when a new one needs a slot and the pool is
//! full.
//!
//! # Capacity
//!
//! Capacity is derived once from a memory budget and the fixed tile byte size:
//!
//! - the budget is clamped to 512 MB – 2 GB
//! - slots = `max(1, budget / tile_byte_size)`
//! - slots are clamped to what the store can address (2048 for the default
//!   store); clamping is logged, not an error
//!
//! # Threading
//!
//! Every mutating operation takes `&mut self`: the cache has a single owner
//! that performs all residency changes. Statistics are the exception; they are
//! atomics behind an `Arc` (see [`TileCache::statistics`]) and can be read from
//! any thread while the owner keeps working.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::error::{CacheError, InitError, StoreError};

use super::coord::TileCoordinate;
use super::eviction::EvictionQueue;
use super::index::ResidencyIndex;
use super::pool::{SlotIndex, SlotPool};
use super::stats::{CacheStatistics, CacheStats};
use super::store::SlotStore;

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Bytes per pixel of the pool's pixel layout (BGRA8).
pub const BYTES_PER_PIXEL: usize = 4;

/// Default tile payload size: 256×256×4 = 256 KiB.
pub const DEFAULT_TILE_BYTE_SIZE: usize = (TILE_SIZE as usize) * (TILE_SIZE as usize) * BYTES_PER_PIXEL;

const MIB: u64 = 1024 * 1024;

/// Smallest accepted memory budget: 512 MB.
pub const MIN_MEMORY_BUDGET: u64 = 512 * MIB;

/// Largest accepted memory budget: 2 GB.
pub const MAX_MEMORY_BUDGET: u64 = 2048 * MIB;

/// Default memory budget: 1 GB.
pub const DEFAULT_MEMORY_BUDGET: u64 = 1024 * MIB;

// =============================================================================
// Cache Config
// =============================================================================

/// Sizing parameters for a tile cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Requested pool size in bytes (clamped on use)
    pub memory_budget: u64,

    /// Size of one tile payload in bytes
    pub tile_byte_size: usize,
}

impl CacheConfig {
    pub fn new(memory_budget: u64, tile_byte_size: usize) -> Self {
        Self {
            memory_budget,
            tile_byte_size,
        }
    }

    /// Memory budget clamped to the accepted range.
    pub fn clamped_budget(&self) -> u64 {
        self.memory_budget.clamp(MIN_MEMORY_BUDGET, MAX_MEMORY_BUDGET)
    }

    /// Slot count for the clamped budget, before the store's slot limit.
    ///
    /// Always at least 1. Returns 0 only for a zero tile size.
    pub fn requested_slots(&self) -> u32 {
        if self.tile_byte_size == 0 {
            return 0;
        }
        let slots = self.clamped_budget() / self.tile_byte_size as u64;
        u32::try_from(slots).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_BUDGET, DEFAULT_TILE_BYTE_SIZE)
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Result of classifying a visible tile set against current residency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Visible tiles with no slot, in input order
    pub to_load: Vec<TileCoordinate>,

    /// Visible tiles already resident, with their slots, in input order
    pub resident: Vec<(TileCoordinate, SlotIndex)>,
}

impl Reconciliation {
    /// Whether every visible tile is resident.
    pub fn is_fully_resident(&self) -> bool {
        self.to_load.is_empty()
    }

    /// Total number of classified tiles.
    pub fn len(&self) -> usize {
        self.to_load.len() + self.resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Tile Cache
// =============================================================================

/// Fixed-capacity tile cache with LRU eviction.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use tile_residency::tile::{CacheConfig, HostMemoryStore, TileCache, TileCoordinate};
///
/// let config = CacheConfig::new(512 * 1024 * 1024, 4);
/// let mut cache = TileCache::initialize(HostMemoryStore::with_max_slots(2), config).unwrap();
///
/// let a = TileCoordinate::new(0, 0, 0);
/// let slot = cache.request_tile(a, Some(Bytes::from_static(&[1, 2, 3, 4]))).unwrap();
///
/// assert_eq!(cache.get_slot(&a), Some(slot));
/// assert_eq!(cache.stats().miss_count, 1);
/// ```
pub struct TileCache<S: SlotStore> {
    store: S,
    config: CacheConfig,
    pool: SlotPool,
    index: ResidencyIndex,
    queue: EvictionQueue,
    stats: Arc<CacheStatistics>,
    /// Logical clock for slot access stamps
    clock: u64,
}

impl<S: SlotStore> TileCache<S> {
    /// Create a cache with no pool allocated.
    ///
    /// The cache has zero capacity until [`reconfigure`](Self::reconfigure)
    /// succeeds. Use this when the owner wants to keep the cache (and its
    /// store) around across failed allocation attempts.
    pub fn new(store: S, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            pool: SlotPool::default(),
            index: ResidencyIndex::default(),
            queue: EvictionQueue::with_capacity(0),
            stats: Arc::new(CacheStatistics::new()),
            clock: 0,
        }
    }

    /// Create a cache and allocate its pool.
    ///
    /// # Errors
    ///
    /// - [`InitError::InvalidTileSize`] if `config.tile_byte_size` is 0
    /// - [`InitError::PoolAllocationFailed`] if the store cannot allocate the
    ///   clamped slot count
    pub fn initialize(store: S, config: CacheConfig) -> Result<Self, InitError> {
        let mut cache = Self::new(store, config);
        cache.allocate_pool()?;
        Ok(cache)
    }

    /// Discard all residency and rebuild the pool for a new memory budget.
    ///
    /// Tile contents are not migrated. If allocation fails the cache is left
    /// shut down (zero capacity).
    pub fn reconfigure(&mut self, memory_budget: u64) -> Result<(), InitError> {
        self.shutdown();
        self.config.memory_budget = memory_budget;
        self.allocate_pool()
    }

    /// Release the pool and clear all residency and statistics.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.is_initialized() {
            debug!(slots = self.pool.capacity(), "Shutting down tile cache");
        }
        self.store.release();
        self.pool.clear();
        self.index.clear();
        self.queue.clear();
        self.stats.reset();
        self.clock = 0;
    }

    fn allocate_pool(&mut self) -> Result<(), InitError> {
        let tile_byte_size = self.config.tile_byte_size;
        if tile_byte_size == 0 {
            return Err(InitError::InvalidTileSize(tile_byte_size));
        }

        let budget = self.config.clamped_budget();
        if budget != self.config.memory_budget {
            debug!(
                requested = self.config.memory_budget,
                clamped = budget,
                "Memory budget clamped"
            );
        }

        let requested = self.config.requested_slots();
        let max_slots = self.store.max_slots();
        let slots = if requested > max_slots {
            warn!(
                requested,
                max_slots, "Slot count exceeds pool limit, clamping to limit"
            );
            max_slots
        } else {
            requested
        };

        if slots == 0 {
            error!("Slot store cannot address any slots");
            return Err(InitError::PoolAllocationFailed {
                slots,
                source: StoreError::Device("store cannot address any slots".to_string()),
            });
        }

        if let Err(source) = self.store.allocate(slots, tile_byte_size) {
            error!(slots, tile_byte_size, error = %source, "Failed to allocate tile pool");
            return Err(InitError::PoolAllocationFailed { slots, source });
        }

        self.pool = SlotPool::new(slots);
        self.index = ResidencyIndex::with_capacity(slots);
        self.queue = EvictionQueue::with_capacity(slots);
        self.clock = 0;
        self.stats.reset();
        self.stats.set_total_slots(slots);

        info!(
            slots,
            pool_mb = budget / MIB,
            tile_byte_size,
            "Initialized tile cache"
        );
        Ok(())
    }

    // =========================================================================
    // Single-tile operations
    // =========================================================================

    /// Get a slot for `coord`, allocating (and possibly evicting) on a miss.
    ///
    /// On a hit the tile is promoted to most recently used and `data` is
    /// ignored. On a miss the tile is bound to a free slot, or to the slot of
    /// the least recently used tile, and `data` (if any) is uploaded.
    ///
    /// # Errors
    ///
    /// - [`CacheError::NoCapacity`] if the cache has no slots
    /// - [`CacheError::UploadFailed`] if the upload fails; the tile stays
    ///   resident in the reported slot with stale contents
    pub fn request_tile(
        &mut self,
        coord: TileCoordinate,
        data: Option<Bytes>,
    ) -> Result<SlotIndex, CacheError> {
        if !self.is_initialized() {
            return Err(CacheError::NoCapacity);
        }

        if let Some(slot) = self.index.get(&coord) {
            self.stats.record_hit();
            self.touch(slot);
            return Ok(slot);
        }

        self.stats.record_miss();
        let slot = self.bind_new(coord)?;

        if let Some(data) = data {
            self.upload(slot, data)?;
        }
        Ok(slot)
    }

    /// Free the slot held by `coord`. No-op if the tile is not resident.
    pub fn release_tile(&mut self, coord: &TileCoordinate) {
        let Some(slot) = self.index.unbind(coord) else {
            return;
        };
        self.pool.vacate(slot);
        self.queue.remove(slot);
        self.stats.set_used_slots(self.pool.used());
        debug!(tile = %coord, slot = slot.get(), "Released tile");
    }

    /// Slot currently holding `coord`.
    ///
    /// Pure lookup: does not change LRU order or statistics.
    pub fn get_slot(&self, coord: &TileCoordinate) -> Option<SlotIndex> {
        self.index.get(coord)
    }

    /// Whether `coord` is resident, without touching it.
    pub fn contains(&self, coord: &TileCoordinate) -> bool {
        self.index.contains(coord)
    }

    /// Overwrite the payload of an occupied slot.
    ///
    /// Does not change LRU order.
    pub fn update_tile_data(&mut self, slot: SlotIndex, data: Bytes) -> Result<(), CacheError> {
        if self.pool.occupant(slot).is_none() {
            return Err(CacheError::InvalidSlot { slot });
        }
        self.upload(slot, data)
    }

    /// Copy out the payload of an occupied slot.
    ///
    /// Returns `None` for free or out-of-range slots, and for slots that were
    /// bound without data and never written.
    pub fn slot_data(&self, slot: SlotIndex) -> Option<Bytes> {
        self.pool.occupant(slot)?;
        self.store.read(slot)
    }

    /// Copy out the payload of a resident tile.
    pub fn tile_data(&self, coord: &TileCoordinate) -> Option<Bytes> {
        self.slot_data(self.get_slot(coord)?)
    }

    /// Native handle of the backing pool, for binding the whole slot array
    /// at draw time.
    pub fn native_handle(&self) -> Option<&S::Handle> {
        self.store.native_handle()
    }

    // =========================================================================
    // Batch operations
    // =========================================================================

    /// Split a visible tile set into resident and to-load tiles.
    ///
    /// Resident tiles count as hits and are promoted; the rest count as
    /// misses. No slot is allocated or evicted. Duplicates are classified per
    /// occurrence. An uninitialized cache reports everything as to-load and
    /// leaves the counters alone.
    pub fn reconcile_visible(&mut self, visible: &[TileCoordinate]) -> Reconciliation {
        if !self.is_initialized() {
            return Reconciliation {
                to_load: visible.to_vec(),
                resident: Vec::new(),
            };
        }

        let mut result = Reconciliation::default();
        for &coord in visible {
            match self.index.get(&coord) {
                Some(slot) => {
                    self.stats.record_hit();
                    self.touch(slot);
                    result.resident.push((coord, slot));
                }
                None => {
                    self.stats.record_miss();
                    result.to_load.push(coord);
                }
            }
        }

        debug!(
            visible = visible.len(),
            resident = result.resident.len(),
            to_load = result.to_load.len(),
            "Reconciled visible tiles"
        );
        result
    }

    /// Upload a batch of decoded tiles.
    ///
    /// Resident tiles are overwritten in place; others are allocated through
    /// [`request_tile`](Self::request_tile). Failed items are logged and
    /// skipped. Returns the number of successful uploads.
    pub fn batch_upload(&mut self, items: &[(TileCoordinate, Bytes)]) -> usize {
        if items.is_empty() {
            return 0;
        }
        if !self.is_initialized() {
            warn!(items = items.len(), "Batch upload on uninitialized tile cache");
            return 0;
        }

        let mut uploaded = 0;
        for (coord, data) in items {
            let result = match self.index.get(coord) {
                Some(slot) => self.update_tile_data(slot, data.clone()),
                None => self.request_tile(*coord, Some(data.clone())).map(|_| ()),
            };

            match result {
                Ok(()) => uploaded += 1,
                Err(e) => warn!(tile = %coord, error = %e, "Skipping tile in batch upload"),
            }
        }

        debug!(uploaded, total = items.len(), "Batch upload complete");
        uploaded
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Active configuration (the budget as last requested, before clamping).
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Whether a pool is allocated.
    pub fn is_initialized(&self) -> bool {
        self.pool.capacity() > 0
    }

    /// Total number of slots.
    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    /// Number of resident tiles.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Resident tiles from least to most recently used.
    pub fn lru_order(&self) -> impl Iterator<Item = (TileCoordinate, SlotIndex)> + '_ {
        let index = &self.index;
        self.queue
            .iter()
            .filter_map(move |slot| index.coord_at(slot).map(|coord| (coord, slot)))
    }

    /// Shared statistics handle, readable from other threads.
    ///
    /// The handle stays valid across reconfiguration; its counters are reset.
    pub fn statistics(&self) -> Arc<CacheStatistics> {
        Arc::clone(&self.stats)
    }

    /// Snapshot of the current statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn tick(&mut self) -> u64 {
        self.clock = self.clock.saturating_add(1);
        self.clock
    }

    fn touch(&mut self, slot: SlotIndex) {
        let now = self.tick();
        self.pool.touch(slot, now);
        self.queue.promote(slot);
    }

    fn bind_new(&mut self, coord: TileCoordinate) -> Result<SlotIndex, CacheError> {
        if self.pool.is_full() {
            self.evict_lru()?;
        }

        let now = self.tick();
        let slot = self
            .pool
            .allocate(coord, now)
            .ok_or(CacheError::NoCapacity)?;
        let bound = self.index.bind(coord, slot);
        debug_assert!(bound, "slot {slot} or tile {coord} already indexed");
        self.queue.promote(slot);
        self.stats.set_used_slots(self.pool.used());
        Ok(slot)
    }

    /// Free the least recently used slot.
    ///
    /// Its residency entry is removed before the slot is handed out again, so
    /// no two tiles ever share a slot.
    fn evict_lru(&mut self) -> Result<(), CacheError> {
        let Some(victim) = self.queue.pop_lru() else {
            // Every occupied slot is queued; an empty queue with occupied
            // slots means the bookkeeping is corrupt.
            debug_assert_eq!(self.pool.used(), 0, "eviction queue empty with occupied slots");
            return Err(CacheError::NoCapacity);
        };

        let evicted = self.index.unbind_slot(victim);
        self.pool.vacate(victim);
        self.stats.record_eviction();
        self.stats.set_used_slots(self.pool.used());

        if let Some(tile) = evicted {
            debug!(tile = %tile, slot = victim.get(), "Evicted least recently used tile");
        }
        Ok(())
    }

    fn upload(&mut self, slot: SlotIndex, data: Bytes) -> Result<(), CacheError> {
        self.store.upload(slot, data).map_err(|source| {
            debug!(slot = slot.get(), error = %source, "Tile upload failed");
            CacheError::UploadFailed { slot, source }
        })
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let stats = self.stats();
        assert!(stats.used_slots <= stats.total_slots);
        assert_eq!(stats.total_slots, self.pool.capacity());
        assert_eq!(stats.used_slots, self.pool.used());
        assert_eq!(self.index.len(), self.pool.used() as usize);
        assert_eq!(self.queue.len(), self.pool.used() as usize);

        let mut queued: Vec<u32> = self.queue.iter().map(SlotIndex::get).collect();
        queued.sort_unstable();
        queued.dedup();
        assert_eq!(queued.len(), self.queue.len(), "slot queued twice");

        for slot in self.pool.iter() {
            let index = slot.physical_index();
            assert_eq!(slot.occupant(), self.index.coord_at(index));
            assert_eq!(slot.is_occupied(), self.queue.contains(index));
            if let Some(coord) = slot.occupant() {
                assert_eq!(self.index.get(&coord), Some(index));
            }
        }
    }
}

impl<S: SlotStore> Drop for TileCache<S> {
    fn drop(&mut self) {
        self.store.release();
    }
}

impl<S: SlotStore> std::fmt::Debug for TileCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
