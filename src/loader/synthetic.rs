//! Deterministic producer for demos and benchmarks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ProducerError;
use crate::tile::{TileCoordinate, BYTES_PER_PIXEL};

use super::grid::GridTileSource;
use super::producer::TileProducer;

/// Producer that fills each tile with a colour derived from its coordinate.
///
/// Tiles outside the grid are reported as [`ProducerError::NotFound`]. An
/// optional delay stands in for decode latency.
#[derive(Debug)]
pub struct SyntheticProducer {
    grid: GridTileSource,
    tile_byte_size: usize,
    delay: Option<Duration>,
    produced: AtomicU64,
}

impl SyntheticProducer {
    pub fn new(grid: GridTileSource, tile_byte_size: usize) -> Self {
        Self {
            grid,
            tile_byte_size,
            delay: None,
            produced: AtomicU64::new(0),
        }
    }

    /// Sleep for `delay` before returning each tile.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of tiles produced so far.
    pub fn produced(&self) -> u64 {
        self.produced.load(Ordering::Relaxed)
    }

    /// BGRA pixel for `coord`.
    fn pixel(coord: &TileCoordinate) -> [u8; BYTES_PER_PIXEL] {
        let b = (coord.x.wrapping_mul(37) & 0xFF) as u8;
        let g = (coord.y.wrapping_mul(59) & 0xFF) as u8;
        let r = (coord.level.wrapping_mul(97) & 0xFF) as u8;
        [b, g, r, 0xFF]
    }
}

#[async_trait]
impl TileProducer for SyntheticProducer {
    async fn produce(&self, coord: TileCoordinate) -> Result<Bytes, ProducerError> {
        if !self.grid.contains(&coord) {
            return Err(ProducerError::NotFound(coord));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let data: Vec<u8> = Self::pixel(&coord)
            .into_iter()
            .cycle()
            .take(self.tile_byte_size)
            .collect();

        self.produced.fetch_add(1, Ordering::Relaxed);
        Ok(Bytes::from(data))
    }
}
