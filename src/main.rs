//! Tile Residency - GPU tile pool simulator.
//!
//! This binary pans a viewport across a synthetic image pyramid, loading each
//! frame's visible tiles into a fixed-size pool and reporting how the pool
//! behaves.

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_residency::{
    config::Config,
    loader::{GridTileSource, SyntheticProducer, TileLoader, Viewport, VisibleTileSource},
    tile::{CacheStats, FallbackResolver, HostMemoryStore, TileCache},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    run_simulation(config).await
}

/// Outcome of a simulation run.
#[derive(Debug, Default, Serialize)]
struct SimulationSummary {
    frames: u32,
    /// Visible tiles drawn from their own slot
    exact_draws: u64,
    /// Visible tiles drawn from a coarser ancestor
    fallback_draws: u64,
    /// Visible tiles with nothing to draw
    missing_draws: u64,
    tiles_uploaded: u64,
    load_failures: u64,
    stats: CacheStats,
}

async fn run_simulation(config: Config) -> ExitCode {
    let store = HostMemoryStore::with_max_slots(config.max_slots);
    let mut cache = match TileCache::initialize(store, config.cache_config()) {
        Ok(cache) => cache,
        Err(e) => {
            error!("Failed to initialize tile cache: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let grid = GridTileSource::new(config.image_width, config.image_height, config.tile_size);
    if config.level > grid.coarsest_level() {
        error!(
            "Configuration error: level {} exceeds coarsest level {}",
            config.level,
            grid.coarsest_level()
        );
        return ExitCode::FAILURE;
    }

    let producer = Arc::new(SyntheticProducer::new(grid, config.tile_byte_size()));
    let loader = TileLoader::new(producer, config.concurrency);
    let resolver =
        FallbackResolver::new(config.fallback_levels).with_coarsest_level(grid.coarsest_level());

    info!("Configuration:");
    info!(
        "  Image: {}x{} px, {} levels",
        config.image_width,
        config.image_height,
        grid.level_count()
    );
    info!(
        "  Viewport: {}x{} px at level {}",
        config.viewport_width, config.viewport_height, config.level
    );
    info!(
        "  Pool: {} slots of {} bytes",
        cache.capacity(),
        config.tile_byte_size()
    );
    info!(
        "  Fallback: up to {} levels, {} loads in flight",
        resolver.max_levels_up(),
        loader.concurrency()
    );

    let mut summary = SimulationSummary::default();
    let mut viewport = config.initial_viewport();

    for frame in 0..config.frames {
        let visible = grid.visible_tiles(&viewport);

        // Draw with whatever is resident before this frame's loads land
        for coord in &visible {
            match resolver.resolve(&cache, *coord) {
                Some(resolved) if resolved.is_exact() => summary.exact_draws += 1,
                Some(_) => summary.fallback_draws += 1,
                None => summary.missing_draws += 1,
            }
        }

        // Coarse level first so the next frame has fallbacks to draw
        if config.level < grid.coarsest_level() {
            let coarse = Viewport {
                level: config.level + 1,
                ..viewport
            };
            let report = loader
                .load_visible(&mut cache, &grid.visible_tiles(&coarse))
                .await;
            summary.tiles_uploaded += report.uploaded as u64;
            summary.load_failures += report.failed as u64;
        }

        let report = loader.load_visible(&mut cache, &visible).await;
        summary.tiles_uploaded += report.uploaded as u64;
        summary.load_failures += report.failed as u64;

        debug!(
            frame,
            visible = visible.len(),
            resident = report.already_resident,
            uploaded = report.uploaded,
            "Frame complete"
        );

        viewport = advance(&config, viewport);
        summary.frames += 1;
    }

    summary.stats = cache.stats();
    report_summary(&config, &summary, loader.producer().produced());

    ExitCode::SUCCESS
}

/// Pan right by one step, wrapping to the next row at the image edge.
fn advance(config: &Config, viewport: Viewport) -> Viewport {
    let step = i64::try_from(config.pan_step).unwrap_or(i64::MAX);
    let next = viewport.translated(step, 0);
    if next.x.saturating_add(next.width) <= config.image_width {
        return next;
    }

    let y = viewport.y.saturating_add(viewport.height);
    Viewport {
        x: 0,
        y: if y.saturating_add(viewport.height) > config.image_height {
            0
        } else {
            y
        },
        ..viewport
    }
}

fn report_summary(config: &Config, summary: &SimulationSummary, produced: u64) {
    if summary.load_failures > 0 {
        warn!("{} tile loads failed", summary.load_failures);
    }

    if config.json {
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
        return;
    }

    let stats = &summary.stats;
    info!("");
    info!("Simulation complete:");
    info!("  Frames: {}", summary.frames);
    info!(
        "  Draws: {} exact, {} fallback, {} missing",
        summary.exact_draws, summary.fallback_draws, summary.missing_draws
    );
    info!(
        "  Tiles produced: {}, uploaded: {}",
        produced, summary.tiles_uploaded
    );
    info!(
        "  Slots: {}/{} used",
        stats.used_slots, stats.total_slots
    );
    info!(
        "  Lookups: {} hits, {} misses ({:.1}% hit rate)",
        stats.hit_count,
        stats.miss_count,
        stats.hit_rate() * 100.0
    );
    info!("  Evictions: {}", stats.eviction_count);
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_residency=debug"
    } else {
        "tile_residency=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        // stdout is reserved for --json output
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
