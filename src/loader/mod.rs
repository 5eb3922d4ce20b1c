//! Tile loading.
//!
//! The loader connects a [`TileCache`](crate::tile::TileCache) to the outside
//! world: a [`VisibleTileSource`] says which tiles a viewport needs, a
//! [`TileProducer`] supplies decoded bytes for the ones that are missing, and
//! [`TileLoader`] runs one frame of reconcile, produce, upload.
//!
//! # Components
//!
//! - [`TileLoader`]: Per-frame driver with bounded producer concurrency
//! - [`TileProducer`]: Async source of decoded tile payloads
//! - [`VisibleTileSource`] / [`Viewport`]: Visible-set computation
//! - [`GridTileSource`]: Power-of-two pyramid grid
//! - [`SyntheticProducer`]: Deterministic producer for demos

mod grid;
mod producer;
mod service;
mod synthetic;

pub use grid::GridTileSource;
pub use producer::{TileProducer, Viewport, VisibleTileSource};
pub use service::{LoadReport, TileLoader, DEFAULT_CONCURRENCY};
pub use synthetic::SyntheticProducer;
