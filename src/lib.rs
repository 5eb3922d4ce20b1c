//! # Tile Residency
//!
//! A residency cache for the tiles of a large image pyramid, drawn from a
//! fixed-size pool of slots (typically the layers of a GPU texture array).
//!
//! A viewer of gigapixel images cannot keep every tile on the GPU. This
//! library decides which tiles occupy the pool, which tile to give up when a
//! new one needs room, and what to draw in place of a tile that is still
//! loading.
//!
//! ## Features
//!
//! - **Fixed-capacity pool**: Slot count derived once from a memory budget
//! - **LRU eviction**: O(1) promote and evict over an arena-backed list
//! - **Per-frame reconciliation**: Split a visible set into resident and to-load
//! - **Fallback resolution**: Draw a coarser resident ancestor for missing tiles
//! - **Lock-free statistics**: Hit/miss/eviction counters readable from any thread
//! - **Concurrent loading**: Tokio-driven producers with bounded concurrency
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`tile`] - Residency cache, slot pool, eviction and fallback
//! - [`loader`] - Visible-set computation and per-frame loading
//! - [`config`] - CLI configuration for the simulator binary
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tile_residency::{
//!     CacheConfig, GridTileSource, HostMemoryStore, SyntheticProducer, TileCache,
//!     TileLoader, Viewport, VisibleTileSource, DEFAULT_TILE_BYTE_SIZE,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut cache = TileCache::initialize(HostMemoryStore::new(), CacheConfig::default())
//!         .expect("pool allocation");
//!
//!     let grid = GridTileSource::new(4096, 4096, 256);
//!     let producer = Arc::new(SyntheticProducer::new(grid, DEFAULT_TILE_BYTE_SIZE));
//!     let loader = TileLoader::new(producer, 4);
//!
//!     let visible = grid.visible_tiles(&Viewport::new(0, 0, 1024, 768, 0));
//!     let report = loader.load_visible(&mut cache, &visible).await;
//!
//!     assert_eq!(report.uploaded, visible.len());
//!     assert_eq!(cache.stats().used_slots as usize, visible.len());
//! }
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod tile;

// Re-export commonly used types
pub use config::Config;
pub use error::{CacheError, InitError, LoadError, ProducerError, StoreError};
pub use loader::{
    GridTileSource, LoadReport, SyntheticProducer, TileLoader, TileProducer, Viewport,
    VisibleTileSource, DEFAULT_CONCURRENCY,
};
pub use tile::{
    CacheConfig, CacheStatistics, CacheStats, FallbackResolver, HostMemoryStore, HostPoolHandle,
    Reconciliation, ResolvedTile, SlotIndex, SlotStore, TileCache, TileCoordinate,
    DEFAULT_MAX_SLOTS, DEFAULT_MEMORY_BUDGET, DEFAULT_TILE_BYTE_SIZE, MAX_MEMORY_BUDGET,
    MIN_MEMORY_BUDGET,
};
