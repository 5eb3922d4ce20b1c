//! Tile residency layer.
//!
//! This module decides which tiles of an image pyramid occupy the slots of a
//! fixed-size backing pool (typically a GPU texture array), and which tile to
//! give up when a new one needs room.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     TileCache                       │
//! │  ┌───────────────┐ ┌──────────────┐ ┌────────────┐  │
//! │  │ResidencyIndex │ │EvictionQueue │ │  SlotPool  │  │
//! │  │ coord <-> slot│ │ (LRU order)  │ │ (occupancy)│  │
//! │  └───────────────┘ └──────────────┘ └────────────┘  │
//! │              CacheStatistics (atomics, Arc)         │
//! └──────────────────────────┬──────────────────────────┘
//!                            │ allocate / upload / read
//!                            ▼
//! ┌─────────────────────────────────────────────────────┐
//! │            SlotStore (HostMemoryStore, GPU)         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileCache`]: Residency facade; the only type that mutates residency
//! - [`SlotStore`]: Capability boundary to the backing pool
//! - [`HostMemoryStore`]: In-process slot store
//! - [`FallbackResolver`]: Finds a resident ancestor for a missing tile
//! - [`CacheStatistics`]: Hit/miss/eviction counters readable from any thread
//!
//! # Example
//!
//! ```
//! use tile_residency::tile::{
//!     CacheConfig, FallbackResolver, HostMemoryStore, TileCache, TileCoordinate,
//! };
//!
//! let mut cache = TileCache::initialize(HostMemoryStore::new(), CacheConfig::default()).unwrap();
//!
//! // Coarse tile is resident, fine one is still loading
//! let coarse = TileCoordinate::new(1, 0, 0);
//! cache.request_tile(coarse, None).unwrap();
//!
//! let resolved = FallbackResolver::default()
//!     .resolve(&cache, TileCoordinate::new(0, 1, 1))
//!     .unwrap();
//! assert_eq!(resolved.coord, coarse);
//! assert_eq!(resolved.levels_up, 1);
//! ```

mod cache;
mod coord;
mod eviction;
mod fallback;
mod index;
mod pool;
mod stats;
mod store;

pub use cache::{
    CacheConfig, Reconciliation, TileCache, BYTES_PER_PIXEL, DEFAULT_MEMORY_BUDGET,
    DEFAULT_TILE_BYTE_SIZE, MAX_MEMORY_BUDGET, MIN_MEMORY_BUDGET, TILE_SIZE,
};
pub use coord::TileCoordinate;
pub use eviction::EvictionQueue;
pub use fallback::{FallbackResolver, ResolvedTile};
pub use index::ResidencyIndex;
pub use pool::{Slot, SlotIndex, SlotPool};
pub use stats::{CacheStatistics, CacheStats};
pub use store::{HostMemoryStore, HostPoolHandle, SlotStore, DEFAULT_MAX_SLOTS};
