//! Coarser-level substitutes for missing tiles.
//!
//! While a tile is still being produced the renderer can draw the matching
//! quadrant of a resident ancestor instead. Level `L + 1` covers each tile of
//! level `L` with one quarter of a tile, so the ancestor of `(L, x, y)` is
//! `(L + 1, x / 2, y / 2)`.

use serde::Serialize;

use super::cache::TileCache;
use super::coord::TileCoordinate;
use super::pool::SlotIndex;
use super::store::SlotStore;

/// A resident tile chosen to stand in for a desired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedTile {
    /// The resident tile (the desired one, or an ancestor)
    pub coord: TileCoordinate,

    /// Slot holding `coord`
    pub slot: SlotIndex,

    /// 0 if the desired tile itself is resident
    pub levels_up: u32,
}

impl ResolvedTile {
    /// Whether this is the desired tile rather than a substitute.
    pub fn is_exact(&self) -> bool {
        self.levels_up == 0
    }
}

/// Finds the closest resident tile for a desired coordinate.
///
/// Lookups are pure: they do not change LRU order or statistics, and never
/// allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackResolver {
    max_levels_up: u32,
    coarsest_level: Option<u32>,
}

impl FallbackResolver {
    /// Resolver that looks at most `max_levels_up` levels above the desired
    /// tile.
    pub fn new(max_levels_up: u32) -> Self {
        Self {
            max_levels_up,
            coarsest_level: None,
        }
    }

    /// Never look above `level` (the coarsest level of the pyramid).
    pub fn with_coarsest_level(mut self, level: u32) -> Self {
        self.coarsest_level = Some(level);
        self
    }

    pub fn max_levels_up(&self) -> u32 {
        self.max_levels_up
    }

    pub fn coarsest_level(&self) -> Option<u32> {
        self.coarsest_level
    }

    /// Resolve `desired` against the cache's current residency.
    ///
    /// Returns the desired tile if resident, else the nearest resident
    /// ancestor within range, else `None`.
    pub fn resolve<S: SlotStore>(
        &self,
        cache: &TileCache<S>,
        desired: TileCoordinate,
    ) -> Option<ResolvedTile> {
        (0..=self.max_levels_up)
            .map_while(|levels_up| {
                let coord = desired.ancestor(levels_up)?;
                match self.coarsest_level {
                    Some(coarsest) if coord.level > coarsest => None,
                    _ => Some((coord, levels_up)),
                }
            })
            .find_map(|(coord, levels_up)| {
                cache.get_slot(&coord).map(|slot| ResolvedTile {
                    coord,
                    slot,
                    levels_up,
                })
            })
    }
}

impl Default for FallbackResolver {
    /// One level up, no coarsest bound.
    fn default() -> Self {
        Self::new(1)
    }
}
