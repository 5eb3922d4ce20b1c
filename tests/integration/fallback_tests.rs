//! Fallback resolution integration tests.
//!
//! Tests verify:
//! - Missing tiles resolve to a resident parent quadrant
//! - Resolution follows residency as tiles are evicted
//! - Resolution never disturbs LRU order or counters

use tile_residency::loader::{GridTileSource, Viewport, VisibleTileSource};
use tile_residency::tile::{FallbackResolver, TileCoordinate};

use super::test_utils::host_cache;

#[test]
fn test_all_four_children_resolve_to_parent() {
    let mut cache = host_cache(4);
    let parent = TileCoordinate::new(3, 5, 9);
    let parent_slot = cache.request_tile(parent, None).unwrap();

    let resolver = FallbackResolver::default();
    for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        let child = TileCoordinate::new(2, 10 + dx, 18 + dy);
        let resolved = resolver.resolve(&cache, child).unwrap();
        assert_eq!(resolved.coord, parent);
        assert_eq!(resolved.slot, parent_slot);
        assert_eq!(resolved.levels_up, 1);
    }

    // Neighbouring tile's parent is not resident
    assert_eq!(resolver.resolve(&cache, TileCoordinate::new(2, 12, 18)), None);
}

#[test]
fn test_resolution_follows_eviction() {
    let mut cache = host_cache(1);
    let parent = TileCoordinate::new(1, 0, 0);
    let child = TileCoordinate::new(0, 1, 1);
    let resolver = FallbackResolver::default();

    cache.request_tile(parent, None).unwrap();
    assert_eq!(resolver.resolve(&cache, child).unwrap().coord, parent);

    // Child evicts its own parent; now it resolves exactly
    cache.request_tile(child, None).unwrap();
    let resolved = resolver.resolve(&cache, child).unwrap();
    assert!(resolved.is_exact());

    cache.release_tile(&child);
    assert_eq!(resolver.resolve(&cache, child), None);
}

#[test]
fn test_resolve_is_read_only() {
    let mut cache = host_cache(2);
    cache.request_tile(TileCoordinate::new(1, 0, 0), None).unwrap();
    cache.request_tile(TileCoordinate::new(1, 1, 0), None).unwrap();
    let before = cache.stats();

    let resolver = FallbackResolver::new(4);
    for x in 0..8 {
        resolver.resolve(&cache, TileCoordinate::new(0, x, 0));
    }
    assert_eq!(cache.stats(), before);

    // (1,0,0) is still the LRU tile despite being resolved most
    cache.request_tile(TileCoordinate::new(0, 0, 0), None).unwrap();
    assert!(!cache.contains(&TileCoordinate::new(1, 0, 0)));
}

#[test]
fn test_viewport_fully_covered_by_coarse_level() {
    let grid = GridTileSource::new(2048, 2048, 256);
    let mut cache = host_cache(64);
    let viewport = Viewport::new(0, 0, 1024, 1024, 0);

    let coarse = Viewport { level: 1, ..viewport };
    for coord in grid.visible_tiles(&coarse) {
        cache.request_tile(coord, None).unwrap();
    }

    let resolver = FallbackResolver::default().with_coarsest_level(grid.coarsest_level());
    let visible = grid.visible_tiles(&viewport);
    assert_eq!(visible.len(), 16);
    for coord in visible {
        let resolved = resolver.resolve(&cache, coord).unwrap();
        assert_eq!(resolved.levels_up, 1);
        assert_eq!(resolved.coord, coord.parent().unwrap());
    }
}
