//! Bidirectional coordinate <-> slot mapping.

use std::collections::HashMap;

use super::coord::TileCoordinate;
use super::pool::SlotIndex;

/// Maps resident tiles to their physical slots and back.
///
/// A tile maps to at most one slot and a slot holds at most one tile.
/// [`bind`](ResidencyIndex::bind) refuses any insertion that would break
/// either direction.
#[derive(Debug, Clone, Default)]
pub struct ResidencyIndex {
    by_coord: HashMap<TileCoordinate, SlotIndex>,
    by_slot: Vec<Option<TileCoordinate>>,
}

impl ResidencyIndex {
    /// Create an index for a pool of `capacity` slots.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            by_coord: HashMap::with_capacity(capacity as usize),
            by_slot: vec![None; capacity as usize],
        }
    }

    /// Slot holding `coord`, if resident.
    pub fn get(&self, coord: &TileCoordinate) -> Option<SlotIndex> {
        self.by_coord.get(coord).copied()
    }

    /// Tile held in `slot`, if any.
    pub fn coord_at(&self, slot: SlotIndex) -> Option<TileCoordinate> {
        self.by_slot.get(slot.as_usize()).copied().flatten()
    }

    /// Whether `coord` is resident.
    pub fn contains(&self, coord: &TileCoordinate) -> bool {
        self.by_coord.contains_key(coord)
    }

    /// Record that `coord` now lives in `slot`.
    ///
    /// Returns `false` (and changes nothing) if the tile is already indexed,
    /// the slot is already taken, or the slot is out of range.
    pub fn bind(&mut self, coord: TileCoordinate, slot: SlotIndex) -> bool {
        match self.by_slot.get(slot.as_usize()) {
            Some(None) if !self.by_coord.contains_key(&coord) => {}
            _ => return false,
        }
        self.by_slot[slot.as_usize()] = Some(coord);
        self.by_coord.insert(coord, slot);
        true
    }

    /// Remove `coord`, returning the slot it occupied.
    pub fn unbind(&mut self, coord: &TileCoordinate) -> Option<SlotIndex> {
        let slot = self.by_coord.remove(coord)?;
        self.by_slot[slot.as_usize()] = None;
        Some(slot)
    }

    /// Remove whatever tile `slot` holds.
    pub fn unbind_slot(&mut self, slot: SlotIndex) -> Option<TileCoordinate> {
        let coord = self.by_slot.get_mut(slot.as_usize())?.take()?;
        self.by_coord.remove(&coord);
        Some(coord)
    }

    /// Number of resident tiles.
    pub fn len(&self) -> usize {
        self.by_coord.len()
    }

    /// Whether no tile is resident.
    pub fn is_empty(&self) -> bool {
        self.by_coord.is_empty()
    }

    /// Remove every entry and shrink to zero slots.
    pub fn clear(&mut self) {
        self.by_coord.clear();
        self.by_slot.clear();
    }
}
