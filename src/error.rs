use thiserror::Error;

use crate::tile::{SlotIndex, TileCoordinate};

/// Errors reported by a backing slot store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Payload does not match the pool's fixed tile byte size
    #[error("Tile payload size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The store could not reserve memory for the requested slots
    #[error("Out of memory: cannot allocate {slots} slots of {tile_byte_size} bytes")]
    OutOfMemory { slots: u32, tile_byte_size: usize },

    /// Slot index is outside the allocated pool
    #[error("Slot {slot} is outside the allocated pool of {capacity} slots")]
    SlotOutOfRange { slot: u32, capacity: u32 },

    /// The pool has not been allocated (or was released)
    #[error("Slot store is not allocated")]
    NotAllocated,

    /// Device-level failure reported by the backend
    #[error("Device error: {0}")]
    Device(String),
}

/// Errors that can occur when creating or reconfiguring a tile cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// The backing pool could not be created at the (already clamped) capacity
    #[error("Failed to allocate tile pool with {slots} slots: {source}")]
    PoolAllocationFailed {
        slots: u32,
        #[source]
        source: StoreError,
    },

    /// Tile byte size must be non-zero
    #[error("Invalid tile byte size: {0}")]
    InvalidTileSize(usize),
}

/// Errors returned by tile cache operations.
///
/// None of these leave the residency bookkeeping in an inconsistent state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache has no slots (not initialized, or shut down)
    #[error("Tile cache has no capacity")]
    NoCapacity,

    /// The slot is bound but its contents could not be written
    #[error("Upload to slot {slot} failed: {source}")]
    UploadFailed {
        slot: SlotIndex,
        #[source]
        source: StoreError,
    },

    /// Slot index out of range or not currently bound to a tile
    #[error("Invalid slot: {slot}")]
    InvalidSlot { slot: SlotIndex },
}

/// Errors reported by a tile producer (the decode pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProducerError {
    /// The pyramid has no tile at this coordinate
    #[error("Tile not found: {0}")]
    NotFound(TileCoordinate),

    /// Decoding the tile failed
    #[error("Failed to decode tile {coord}: {message}")]
    Decode {
        coord: TileCoordinate,
        message: String,
    },
}

/// Errors from loading a single tile through the loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The producer could not supply the tile bytes
    #[error("Producer error: {0}")]
    Producer(#[from] ProducerError),

    /// The cache rejected the tile
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// The producer task panicked or was aborted
    #[error("Producer task failed for {0}")]
    TaskFailed(TileCoordinate),
}
