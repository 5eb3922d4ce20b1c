//! Configuration for the residency simulator.
//!
//! This module provides the command-line configuration of the `tile-residency`
//! binary:
//! - Command-line arguments via clap
//! - Environment variables with `TILE_` prefix
//! - Defaults matching the cache's own defaults
//!
//! # Example
//!
//! ```ignore
//! use tile_residency::config::Config;
//!
//! let config = Config::parse();
//! let cache_config = config.cache_config();
//! println!("Pool budget: {} bytes", cache_config.memory_budget);
//! ```
//!
//! # Environment Variables
//!
//! - `TILE_POOL_SIZE_MB` - Slot pool budget in MB (default: 1024, clamped to 512-2048)
//! - `TILE_TILE_SIZE` - Tile edge length in pixels (default: 256)
//! - `TILE_MAX_SLOTS` - Maximum slots the pool can address (default: 2048)
//! - `TILE_IMAGE_WIDTH` / `TILE_IMAGE_HEIGHT` - Simulated image size in pixels
//! - `TILE_VIEWPORT_WIDTH` / `TILE_VIEWPORT_HEIGHT` - Viewport size in pixels
//! - `TILE_FRAMES` - Number of frames to simulate (default: 120)
//! - `TILE_PAN_STEP` - Horizontal pan per frame in level-0 pixels (default: 256)
//! - `TILE_LEVEL` - Pyramid level to draw (default: 0)
//! - `TILE_FALLBACK_LEVELS` - Levels to search for a fallback tile (default: 1)
//! - `TILE_CONCURRENCY` - Concurrent tile producers (default: 8)

use clap::Parser;

use crate::loader::{Viewport, DEFAULT_CONCURRENCY};
use crate::tile::{CacheConfig, BYTES_PER_PIXEL, DEFAULT_MAX_SLOTS, TILE_SIZE};

// =============================================================================
// Default Values
// =============================================================================

/// Default pool budget in MB.
pub const DEFAULT_POOL_SIZE_MB: u64 = 1024;

/// Largest accepted tile edge length in pixels.
pub const MAX_TILE_SIZE: u32 = 4096;

/// Default simulated image width (a typical slide scan).
pub const DEFAULT_IMAGE_WIDTH: u64 = 100_000;

/// Default simulated image height.
pub const DEFAULT_IMAGE_HEIGHT: u64 = 80_000;

/// Default viewport width.
pub const DEFAULT_VIEWPORT_WIDTH: u64 = 1920;

/// Default viewport height.
pub const DEFAULT_VIEWPORT_HEIGHT: u64 = 1080;

/// Default number of simulated frames.
pub const DEFAULT_FRAMES: u32 = 120;

/// Default pan per frame in level-0 pixels.
pub const DEFAULT_PAN_STEP: u64 = 256;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Residency - GPU tile pool simulator.
///
/// Pans a viewport across a synthetic image pyramid and reports how the
/// fixed-size tile pool behaves: hits, misses, evictions and fallbacks.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-residency")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Pool Configuration
    // =========================================================================
    /// Slot pool budget in MB (clamped to 512-2048).
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE_MB, env = "TILE_POOL_SIZE_MB")]
    pub pool_size_mb: u64,

    /// Tile edge length in pixels (4 bytes per pixel).
    #[arg(long, default_value_t = TILE_SIZE, env = "TILE_TILE_SIZE")]
    pub tile_size: u32,

    /// Maximum number of slots the pool can address.
    #[arg(long, default_value_t = DEFAULT_MAX_SLOTS, env = "TILE_MAX_SLOTS")]
    pub max_slots: u32,

    // =========================================================================
    // Simulation Configuration
    // =========================================================================
    /// Width of the simulated image in pixels.
    #[arg(long, default_value_t = DEFAULT_IMAGE_WIDTH, env = "TILE_IMAGE_WIDTH")]
    pub image_width: u64,

    /// Height of the simulated image in pixels.
    #[arg(long, default_value_t = DEFAULT_IMAGE_HEIGHT, env = "TILE_IMAGE_HEIGHT")]
    pub image_height: u64,

    /// Viewport width in pixels.
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_WIDTH, env = "TILE_VIEWPORT_WIDTH")]
    pub viewport_width: u64,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_HEIGHT, env = "TILE_VIEWPORT_HEIGHT")]
    pub viewport_height: u64,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = DEFAULT_FRAMES, env = "TILE_FRAMES")]
    pub frames: u32,

    /// Horizontal pan per frame in level-0 pixels.
    #[arg(long, default_value_t = DEFAULT_PAN_STEP, env = "TILE_PAN_STEP")]
    pub pan_step: u64,

    /// Pyramid level to draw (0 = full resolution).
    #[arg(long, default_value_t = 0, env = "TILE_LEVEL")]
    pub level: u32,

    /// Number of coarser levels to search for a fallback tile.
    #[arg(long, default_value_t = 1, env = "TILE_FALLBACK_LEVELS")]
    pub fallback_levels: u32,

    /// Maximum number of tiles produced concurrently.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, env = "TILE_CONCURRENCY")]
    pub concurrency: usize,

    // =========================================================================
    // Output Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Print the final statistics as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.pool_size_mb == 0 {
            return Err("pool_size_mb must be greater than 0".to_string());
        }

        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(format!("tile_size must be between 1 and {MAX_TILE_SIZE}"));
        }

        if self.max_slots == 0 {
            return Err("max_slots must be greater than 0".to_string());
        }

        if self.image_width == 0 || self.image_height == 0 {
            return Err("image dimensions must be greater than 0".to_string());
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err("viewport dimensions must be greater than 0".to_string());
        }

        if self.frames == 0 {
            return Err("frames must be greater than 0".to_string());
        }

        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }

        if self.level >= 64 {
            return Err("level must be below 64".to_string());
        }

        Ok(())
    }

    /// Size of one tile payload in bytes.
    pub fn tile_byte_size(&self) -> usize {
        let edge = self.tile_size as usize;
        edge * edge * BYTES_PER_PIXEL
    }

    /// Cache sizing for this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(
            self.pool_size_mb.saturating_mul(1024 * 1024),
            self.tile_byte_size(),
        )
    }

    /// Viewport for the first frame, anchored at the image origin.
    pub fn initial_viewport(&self) -> Viewport {
        Viewport::new(0, 0, self.viewport_width, self.viewport_height, self.level)
    }
}

// =============================================================================
// Tests
// =============================================================================
