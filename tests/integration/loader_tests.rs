//! Frame loading integration tests.
//!
//! Tests verify:
//! - Panning only produces tiles entering the viewport
//! - Missing tiles are reported without blocking the rest of the frame
//! - Concurrent producers run in parallel up to the configured limit
//! - The synthetic pipeline fills a real-sized pool

use std::sync::Arc;
use std::time::Duration;

use tile_residency::loader::{
    GridTileSource, SyntheticProducer, TileLoader, Viewport, VisibleTileSource,
};
use tile_residency::tile::{
    CacheConfig, FallbackResolver, HostMemoryStore, TileCache, DEFAULT_TILE_BYTE_SIZE,
};

use super::test_utils::{host_cache, tile, tile_payload, TrackingProducer};

#[tokio::test]
async fn test_pan_only_loads_new_column() {
    let grid = GridTileSource::new(4096, 1024, 256);
    let producer = Arc::new(TrackingProducer::new());
    let loader = TileLoader::new(Arc::clone(&producer), 4);
    let mut cache = host_cache(64);

    let viewport = Viewport::new(0, 0, 1024, 512, 0);
    let first = loader
        .load_visible(&mut cache, &grid.visible_tiles(&viewport))
        .await;
    assert_eq!(first.uploaded, 8);

    // One tile to the right: one new column of two tiles
    let moved = viewport.translated(256, 0);
    let second = loader
        .load_visible(&mut cache, &grid.visible_tiles(&moved))
        .await;

    assert_eq!(second.requested, 8);
    assert_eq!(second.already_resident, 6);
    assert_eq!(second.uploaded, 2);
    assert_eq!(producer.request_count(), 10);

    let requests = producer.get_requests().await;
    assert!(requests[8..].iter().all(|coord| coord.x == 4));
}

#[tokio::test]
async fn test_missing_tile_does_not_block_frame() {
    let producer = Arc::new(TrackingProducer::new().with_missing(tile(1)));
    let loader = TileLoader::new(producer, 2);
    let mut cache = host_cache(8);

    let visible = vec![tile(0), tile(1), tile(2)];
    let report = loader.load_visible(&mut cache, &visible).await;

    assert_eq!(report.uploaded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(cache.tile_data(&tile(0)), Some(tile_payload(tile(0))));
    assert_eq!(cache.tile_data(&tile(2)), Some(tile_payload(tile(2))));
    assert!(!cache.contains(&tile(1)));

    // The missing tile is retried on the next frame
    let again = loader.load_visible(&mut cache, &visible).await;
    assert_eq!(again.already_resident, 2);
    assert_eq!(again.failed, 1);
}

#[tokio::test]
async fn test_producers_run_concurrently() {
    let producer = Arc::new(TrackingProducer::new().with_delay(Duration::from_millis(50)));
    let loader = TileLoader::new(Arc::clone(&producer), 4);
    let mut cache = host_cache(16);

    let visible: Vec<_> = (0..8).map(tile).collect();
    let report = loader.load_visible(&mut cache, &visible).await;

    assert_eq!(report.uploaded, 8);
    let peak = producer.peak_in_flight();
    assert!(peak > 1, "producers never overlapped");
    assert!(peak <= 4, "peak {} exceeds concurrency limit", peak);
}

#[tokio::test]
async fn test_load_tile_single() {
    let producer = Arc::new(TrackingProducer::new());
    let loader = TileLoader::new(Arc::clone(&producer), 1);
    let mut cache = host_cache(4);

    let slot = loader.load_tile(&mut cache, tile(7)).await.unwrap();
    assert_eq!(cache.slot_data(slot), Some(tile_payload(tile(7))));

    loader.load_tile(&mut cache, tile(7)).await.unwrap();
    assert_eq!(producer.request_count(), 1);
}

#[tokio::test]
async fn test_synthetic_pipeline_with_default_pool() {
    let grid = GridTileSource::new(16_384, 16_384, 256);
    let producer = Arc::new(SyntheticProducer::new(grid, DEFAULT_TILE_BYTE_SIZE));
    let loader = TileLoader::new(Arc::clone(&producer), 8);
    let mut cache = TileCache::initialize(HostMemoryStore::new(), CacheConfig::default()).unwrap();
    let resolver = FallbackResolver::default().with_coarsest_level(grid.coarsest_level());

    let mut viewport = Viewport::new(0, 0, 1920, 1080, 0);
    for _ in 0..10 {
        let coarse = Viewport { level: 1, ..viewport };
        loader
            .load_visible(&mut cache, &grid.visible_tiles(&coarse))
            .await;

        // Everything in view has at least a coarse stand-in before loading
        let visible = grid.visible_tiles(&viewport);
        for coord in &visible {
            assert!(resolver.resolve(&cache, *coord).is_some());
        }

        let report = loader.load_visible(&mut cache, &visible).await;
        assert!(report.is_complete());
        viewport = viewport.translated(512, 0);
    }

    let stats = cache.stats();
    assert_eq!(stats.total_slots, 2048);
    assert!(stats.used_slots as u64 <= producer.produced());
    assert!(stats.hit_count > 0);
    assert_eq!(stats.eviction_count, 0);
}
