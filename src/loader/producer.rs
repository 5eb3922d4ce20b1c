use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ProducerError;
use crate::tile::TileCoordinate;

/// Source of decoded tile payloads.
///
/// Implementations wrap the decode pipeline (file parsing, JPEG decode,
/// colour conversion). Payloads must be exactly the cache's tile byte size in
/// the pool's pixel layout. Implementations must be thread-safe; the loader
/// calls `produce` from several tasks at once.
#[async_trait]
pub trait TileProducer: Send + Sync {
    /// Produce the payload for `coord`.
    async fn produce(&self, coord: TileCoordinate) -> Result<Bytes, ProducerError>;
}

/// Computes which tiles a viewport needs.
pub trait VisibleTileSource {
    /// Tiles covering `viewport`, row-major from the top-left.
    fn visible_tiles(&self, viewport: &Viewport) -> Vec<TileCoordinate>;
}

/// A rectangle of the image to draw, and the pyramid level to draw it at.
///
/// The rectangle is in full-resolution (level 0) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: u64,
    pub y: u64,
    pub width: u64,
    pub height: u64,

    /// Pyramid level to sample
    pub level: u32,
}

impl Viewport {
    pub fn new(x: u64, y: u64, width: u64, height: u64, level: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            level,
        }
    }

    /// Same rectangle moved by `(dx, dy)`, stopping at the origin.
    pub fn translated(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add_signed(dx),
            y: self.y.saturating_add_signed(dy),
            ..*self
        }
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
