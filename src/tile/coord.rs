//! Logical tile addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical address of a tile in an image pyramid.
///
/// Level 0 is the full-resolution image; each level above it is half the
/// width and height of the one below, so a tile at `level + 1` covers the
/// 2×2 block of tiles beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoordinate {
    /// Pyramid level (0 = highest resolution)
    pub level: u32,

    /// Tile X coordinate (0-indexed from left)
    pub x: u32,

    /// Tile Y coordinate (0-indexed from top)
    pub y: u32,
}

impl TileCoordinate {
    /// Create a new tile coordinate.
    pub const fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }

    /// The tile one level coarser that covers this tile's area.
    ///
    /// Returns `None` at `u32::MAX`, where no coarser level can be addressed.
    pub fn parent(&self) -> Option<Self> {
        let level = self.level.checked_add(1)?;
        Some(Self::new(level, self.x / 2, self.y / 2))
    }

    /// The ancestor `levels_up` levels coarser than this tile.
    ///
    /// `ancestor(0)` is the tile itself.
    pub fn ancestor(&self, levels_up: u32) -> Option<Self> {
        let level = self.level.checked_add(levels_up)?;
        // Shifting a u32 by 32 or more would overflow; everything collapses to 0 there.
        let x = self.x.checked_shr(levels_up).unwrap_or(0);
        let y = self.y.checked_shr(levels_up).unwrap_or(0);
        Some(Self::new(level, x, y))
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}
