//! Backing stores for the slot pool.
//!
//! The cache never touches tile bytes itself. It asks a [`SlotStore`] to
//! allocate a pool of fixed-size slots and to copy payloads in and out. A GPU
//! renderer implements the trait over a texture array; [`HostMemoryStore`]
//! keeps the slots in process memory.

use bytes::Bytes;

use crate::error::StoreError;

use super::pool::SlotIndex;

/// Default maximum number of slots a pool can address.
///
/// This is the array-layer limit of common GPU texture arrays.
pub const DEFAULT_MAX_SLOTS: u32 = 2048;

/// Capability interface to a fixed-size pool of tile slots.
///
/// All methods are called from the cache's owning thread only.
pub trait SlotStore {
    /// Opaque handle a renderer binds to draw from the whole pool.
    type Handle;

    /// Largest slot count this store can address.
    fn max_slots(&self) -> u32;

    /// Allocate `slot_count` slots of `tile_byte_size` bytes each.
    ///
    /// Any previous allocation is discarded.
    fn allocate(&mut self, slot_count: u32, tile_byte_size: usize) -> Result<(), StoreError>;

    /// Copy a full tile payload into `slot`.
    fn upload(&mut self, slot: SlotIndex, data: Bytes) -> Result<(), StoreError>;

    /// Copy the payload of `slot` out, if it has ever been written.
    fn read(&self, slot: SlotIndex) -> Option<Bytes>;

    /// Release the pool. Must be safe to call when nothing is allocated.
    fn release(&mut self);

    /// Handle to the allocated pool, `None` when released.
    fn native_handle(&self) -> Option<&Self::Handle>;
}

// =============================================================================
// Host Memory Store
// =============================================================================

/// Handle to a [`HostMemoryStore`] allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostPoolHandle {
    /// Increments on every allocation, so handles from a previous pool are
    /// distinguishable from the current one.
    pub generation: u64,

    /// Number of slots in the pool
    pub slot_count: u32,

    /// Size of each slot in bytes
    pub tile_byte_size: usize,
}

/// Slot store backed by process memory.
///
/// Slot payloads are stored lazily: memory is only held for slots that have
/// been written. An optional memory limit makes allocation fail the way a
/// device would when asked for more than it has.
#[derive(Debug, Clone)]
pub struct HostMemoryStore {
    max_slots: u32,
    memory_limit: Option<u64>,
    slots: Vec<Option<Bytes>>,
    handle: Option<HostPoolHandle>,
    generation: u64,
}

impl HostMemoryStore {
    /// Create a store with the default slot limit and no memory limit.
    pub fn new() -> Self {
        Self::with_max_slots(DEFAULT_MAX_SLOTS)
    }

    /// Create a store that can address at most `max_slots` slots.
    pub fn with_max_slots(max_slots: u32) -> Self {
        Self {
            max_slots,
            memory_limit: None,
            slots: Vec::new(),
            handle: None,
            generation: 0,
        }
    }

    /// Refuse allocations larger than `bytes` in total.
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Number of slots holding a payload.
    pub fn written_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn tile_byte_size(&self) -> Option<usize> {
        self.handle.map(|h| h.tile_byte_size)
    }
}

impl Default for HostMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotStore for HostMemoryStore {
    type Handle = HostPoolHandle;

    fn max_slots(&self) -> u32 {
        self.max_slots
    }

    fn allocate(&mut self, slot_count: u32, tile_byte_size: usize) -> Result<(), StoreError> {
        self.release();

        let requested = u64::from(slot_count).saturating_mul(tile_byte_size as u64);
        if slot_count > self.max_slots || self.memory_limit.is_some_and(|limit| requested > limit) {
            return Err(StoreError::OutOfMemory {
                slots: slot_count,
                tile_byte_size,
            });
        }

        self.generation += 1;
        self.slots = vec![None; slot_count as usize];
        self.handle = Some(HostPoolHandle {
            generation: self.generation,
            slot_count,
            tile_byte_size,
        });
        Ok(())
    }

    fn upload(&mut self, slot: SlotIndex, data: Bytes) -> Result<(), StoreError> {
        let expected = self.tile_byte_size().ok_or(StoreError::NotAllocated)?;
        if data.len() != expected {
            return Err(StoreError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let capacity = self.slots.len() as u32;
        let entry = self
            .slots
            .get_mut(slot.as_usize())
            .ok_or(StoreError::SlotOutOfRange {
                slot: slot.get(),
                capacity,
            })?;
        *entry = Some(data);
        Ok(())
    }

    fn read(&self, slot: SlotIndex) -> Option<Bytes> {
        self.slots.get(slot.as_usize()).cloned().flatten()
    }

    fn release(&mut self) {
        self.slots.clear();
        self.handle = None;
    }

    fn native_handle(&self) -> Option<&Self::Handle> {
        self.handle.as_ref()
    }
}
