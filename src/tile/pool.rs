//! Physical slot bookkeeping.
//!
//! The pool tracks which physical slots are free and which tile each occupied
//! slot holds. It has no eviction policy of its own; the cache decides which
//! slot to give up when the pool is full.

use std::fmt;

use serde::Serialize;

use super::coord::TileCoordinate;

// =============================================================================
// Slot Index
// =============================================================================

/// Opaque physical index of a slot in the backing pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Wrap a raw physical index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw physical index (e.g. the array layer to sample from).
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Slot
// =============================================================================

/// One physical slot of the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    physical_index: SlotIndex,
    occupant: Option<TileCoordinate>,
    last_access: u64,
}

impl Slot {
    fn vacant(physical_index: SlotIndex) -> Self {
        Self {
            physical_index,
            occupant: None,
            last_access: 0,
        }
    }

    /// Physical index of this slot.
    pub fn physical_index(&self) -> SlotIndex {
        self.physical_index
    }

    /// The tile currently held, if any.
    pub fn occupant(&self) -> Option<TileCoordinate> {
        self.occupant
    }

    /// Logical clock value of the last bind or access.
    pub fn last_access(&self) -> u64 {
        self.last_access
    }

    /// Whether the slot holds a tile.
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

// =============================================================================
// Slot Pool
// =============================================================================

/// Fixed-capacity array of physical slots.
///
/// Free slots are kept on a stack so allocation is O(1). A fresh pool hands
/// out slots in ascending index order.
#[derive(Debug, Clone, Default)]
pub struct SlotPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl SlotPool {
    /// Create a pool with `capacity` vacant slots.
    pub fn new(capacity: u32) -> Self {
        Self {
            slots: (0..capacity).map(|i| Slot::vacant(SlotIndex(i))).collect(),
            free: (0..capacity).rev().collect(),
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Number of occupied slots.
    pub fn used(&self) -> u32 {
        (self.slots.len() - self.free.len()) as u32
    }

    /// Whether every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.free.len() == self.slots.len()
    }

    /// Get a slot by index.
    pub fn get(&self, slot: SlotIndex) -> Option<&Slot> {
        self.slots.get(slot.as_usize())
    }

    /// The tile held by `slot`, if the slot exists and is occupied.
    pub fn occupant(&self, slot: SlotIndex) -> Option<TileCoordinate> {
        self.get(slot).and_then(Slot::occupant)
    }

    /// Bind `coord` to a free slot, stamping it with `now`.
    ///
    /// Returns `None` when the pool is full.
    pub fn allocate(&mut self, coord: TileCoordinate, now: u64) -> Option<SlotIndex> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.occupant.is_none(), "free list held occupied slot {index}");
        slot.occupant = Some(coord);
        slot.last_access = now;
        Some(slot.physical_index)
    }

    /// Record an access to an occupied slot.
    pub fn touch(&mut self, slot: SlotIndex, now: u64) {
        if let Some(slot) = self.slots.get_mut(slot.as_usize()) {
            if slot.occupant.is_some() {
                slot.last_access = now;
            }
        }
    }

    /// Vacate a slot and return it to the free list.
    ///
    /// Returns the tile it held, or `None` if it was already free.
    pub fn vacate(&mut self, slot: SlotIndex) -> Option<TileCoordinate> {
        let entry = self.slots.get_mut(slot.as_usize())?;
        let occupant = entry.occupant.take()?;
        entry.last_access = 0;
        self.free.push(slot.get());
        Some(occupant)
    }

    /// Iterate over all slots in physical order.
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Drop every slot, leaving a zero-capacity pool.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
