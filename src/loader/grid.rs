//! Regular tile grid over an image pyramid.

use crate::tile::TileCoordinate;

use super::producer::{Viewport, VisibleTileSource};

/// Tile grid of a power-of-two pyramid.
///
/// Level 0 is `width × height` pixels; each level above halves both
/// dimensions (rounding up). The pyramid stops at the first level that fits in
/// a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridTileSource {
    width: u64,
    height: u64,
    tile_size: u32,
    level_count: u32,
}

impl GridTileSource {
    /// Create a grid for an image of `width × height` pixels.
    ///
    /// A zero `tile_size` is treated as 1.
    pub fn new(width: u64, height: u64, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        let mut level_count = 1;
        let (mut w, mut h) = (width, height);
        while (w > tile_size as u64 || h > tile_size as u64) && level_count < 64 {
            w = w.div_ceil(2);
            h = h.div_ceil(2);
            level_count += 1;
        }

        Self {
            width,
            height,
            tile_size,
            level_count,
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Number of pyramid levels.
    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    /// Coarsest level index.
    pub fn coarsest_level(&self) -> u32 {
        self.level_count - 1
    }

    /// Pixel dimensions of `level`, or `None` past the coarsest level.
    pub fn level_dimensions(&self, level: u32) -> Option<(u64, u64)> {
        if level >= self.level_count {
            return None;
        }
        let scale = 1u64 << level;
        Some((self.width.div_ceil(scale), self.height.div_ceil(scale)))
    }

    /// Number of tiles across and down at `level`.
    pub fn tiles_at(&self, level: u32) -> Option<(u32, u32)> {
        let (w, h) = self.level_dimensions(level)?;
        let tile = self.tile_size as u64;
        let tiles_x = u32::try_from(w.div_ceil(tile)).unwrap_or(u32::MAX);
        let tiles_y = u32::try_from(h.div_ceil(tile)).unwrap_or(u32::MAX);
        Some((tiles_x, tiles_y))
    }

    /// Whether `coord` lies inside the grid.
    pub fn contains(&self, coord: &TileCoordinate) -> bool {
        self.tiles_at(coord.level)
            .is_some_and(|(tiles_x, tiles_y)| coord.x < tiles_x && coord.y < tiles_y)
    }
}

impl VisibleTileSource for GridTileSource {
    fn visible_tiles(&self, viewport: &Viewport) -> Vec<TileCoordinate> {
        if viewport.is_empty() {
            return Vec::new();
        }
        let Some((tiles_x, tiles_y)) = self.tiles_at(viewport.level) else {
            return Vec::new();
        };

        // Tile footprint in level-0 pixels; past u64 nothing is addressable
        let Some(span) = 1u64
            .checked_shl(viewport.level)
            .and_then(|scale| (self.tile_size as u64).checked_mul(scale))
        else {
            return Vec::new();
        };
        let range = |start: u64, len: u64, count: u32| {
            let first = start / span;
            let end = start.saturating_add(len).div_ceil(span).min(count as u64);
            first..end
        };

        let xs = range(viewport.x, viewport.width, tiles_x);
        let ys = range(viewport.y, viewport.height, tiles_y);

        let mut tiles = Vec::new();
        for y in ys {
            for x in xs.clone() {
                tiles.push(TileCoordinate::new(viewport.level, x as u32, y as u32));
            }
        }
        tiles
    }
}
