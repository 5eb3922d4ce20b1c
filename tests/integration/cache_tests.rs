//! Residency integration tests.
//!
//! Tests verify:
//! - LRU eviction order across mixed request patterns
//! - Capacity clamping and pool allocation through the store
//! - Upload failure handling leaves bookkeeping consistent
//! - Statistics are readable from other threads during mutation

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use tile_residency::error::{CacheError, InitError};
use tile_residency::tile::{
    CacheConfig, HostMemoryStore, TileCache, TileCoordinate, DEFAULT_TILE_BYTE_SIZE,
    MAX_MEMORY_BUDGET,
};

use super::test_utils::{host_cache, test_config, tile, tile_payload, RecordingStore, TEST_TILE_BYTES};

// =============================================================================
// Eviction
// =============================================================================

#[test]
fn test_capacity_two_scenario() {
    let mut cache = host_cache(2);
    let (a, b, c, d) = (tile(0), tile(1), tile(2), tile(3));

    cache.request_tile(a, Some(tile_payload(a))).unwrap();
    cache.request_tile(b, Some(tile_payload(b))).unwrap();
    cache.request_tile(c, Some(tile_payload(c))).unwrap();

    assert!(!cache.contains(&a));
    assert_eq!(cache.tile_data(&b), Some(tile_payload(b)));
    assert_eq!(cache.tile_data(&c), Some(tile_payload(c)));

    cache.request_tile(b, None).unwrap();
    cache.request_tile(d, Some(tile_payload(d))).unwrap();

    assert!(!cache.contains(&c));
    assert!(cache.contains(&b));
    assert!(cache.contains(&d));

    let stats = cache.stats();
    assert_eq!(stats.used_slots, 2);
    assert_eq!(stats.miss_count, 4);
    assert_eq!(stats.hit_count, 1);
    assert_eq!(stats.eviction_count, 2);
}

#[test]
fn test_working_set_within_capacity_never_evicts() {
    let mut cache = host_cache(16);
    for _ in 0..10 {
        for x in 0..16 {
            cache.request_tile(tile(x), None).unwrap();
        }
    }
    let stats = cache.stats();
    assert_eq!(stats.eviction_count, 0);
    assert_eq!(stats.miss_count, 16);
    assert_eq!(stats.hit_count, 16 * 9);
}

#[test]
fn test_cyclic_scan_larger_than_capacity_always_misses() {
    let mut cache = host_cache(4);
    for _ in 0..3 {
        for x in 0..5 {
            cache.request_tile(tile(x), None).unwrap();
        }
    }
    // Classic LRU worst case: every access evicts the next tile needed
    assert_eq!(cache.stats().hit_count, 0);
    assert_eq!(cache.stats().miss_count, 15);
}

#[test]
fn test_slots_are_unique_under_churn() {
    let mut cache = host_cache(8);
    for i in 0..500u32 {
        let coord = TileCoordinate::new(i % 3, (i * 7) % 13, (i * 11) % 5);
        cache.request_tile(coord, None).unwrap();
        if i % 5 == 0 {
            cache.release_tile(&TileCoordinate::new(0, i % 13, 0));
        }

        let resident: Vec<_> = cache.lru_order().collect();
        let slots: HashSet<_> = resident.iter().map(|(_, slot)| *slot).collect();
        let coords: HashSet<_> = resident.iter().map(|(coord, _)| *coord).collect();
        assert_eq!(slots.len(), resident.len());
        assert_eq!(coords.len(), resident.len());
        assert_eq!(resident.len(), cache.len());
        assert!(cache.stats().used_slots <= cache.stats().total_slots);
    }
}

#[test]
fn test_release_then_request_reuses_slot_without_eviction() {
    let mut cache = host_cache(2);
    let a_slot = cache.request_tile(tile(0), None).unwrap();
    cache.request_tile(tile(1), None).unwrap();

    cache.release_tile(&tile(0));
    let c_slot = cache.request_tile(tile(2), None).unwrap();

    assert_eq!(c_slot, a_slot);
    assert_eq!(cache.stats().eviction_count, 0);
}

// =============================================================================
// Pool Allocation
// =============================================================================

#[test]
fn test_default_budget_clamped_to_store_limit() {
    let store = RecordingStore::new(2048);
    let log = store.log();

    let cache = TileCache::initialize(store, CacheConfig::default()).unwrap();

    assert_eq!(cache.capacity(), 2048);
    assert_eq!(
        log.lock().unwrap().allocations,
        vec![(2048, DEFAULT_TILE_BYTE_SIZE)]
    );
}

#[test]
fn test_allocation_failure_reported() {
    let store = RecordingStore::new(2048).with_memory_limit(1024);
    let result = TileCache::initialize(store, test_config());

    match result {
        Err(InitError::PoolAllocationFailed { slots, .. }) => assert_eq!(slots, 2048),
        other => panic!("expected PoolAllocationFailed, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_reconfigure_releases_and_reallocates() {
    let store = RecordingStore::new(64);
    let log = store.log();
    let mut cache = TileCache::initialize(store, test_config()).unwrap();
    cache.request_tile(tile(0), Some(tile_payload(tile(0)))).unwrap();

    cache.reconfigure(MAX_MEMORY_BUDGET).unwrap();

    assert!(!cache.contains(&tile(0)));
    assert_eq!(cache.capacity(), 64);
    let log = log.lock().unwrap();
    assert_eq!(log.allocations.len(), 2);
    assert!(log.releases >= 1);
}

#[test]
fn test_drop_releases_store() {
    let store = RecordingStore::new(4);
    let log = store.log();
    {
        let _cache = TileCache::initialize(store, test_config()).unwrap();
    }
    assert!(log.lock().unwrap().releases >= 1);
}

#[test]
fn test_native_handle_tracks_pool_generation() {
    let mut cache = TileCache::initialize(RecordingStore::new(4), test_config()).unwrap();
    assert_eq!(cache.native_handle(), Some(&1));

    cache.reconfigure(MAX_MEMORY_BUDGET).unwrap();
    assert_eq!(cache.native_handle(), Some(&2));

    cache.shutdown();
    assert_eq!(cache.native_handle(), None);
}

// =============================================================================
// Upload Failures
// =============================================================================

#[test]
fn test_upload_failure_then_retry() {
    let store = RecordingStore::new(4);
    let failing = store.failing_slots();
    failing.lock().unwrap().insert(0);
    let mut cache = TileCache::initialize(store, test_config()).unwrap();

    let err = cache
        .request_tile(tile(0), Some(tile_payload(tile(0))))
        .unwrap_err();
    let slot = match err {
        CacheError::UploadFailed { slot, .. } => slot,
        other => panic!("expected UploadFailed, got {other:?}"),
    };

    // Bound with stale contents
    assert_eq!(cache.get_slot(&tile(0)), Some(slot));
    assert_eq!(cache.slot_data(slot), None);

    failing.lock().unwrap().clear();
    cache.update_tile_data(slot, tile_payload(tile(0))).unwrap();
    assert_eq!(cache.tile_data(&tile(0)), Some(tile_payload(tile(0))));
}

#[test]
fn test_batch_upload_skips_failing_slot() {
    let store = RecordingStore::new(4);
    let failing = store.failing_slots();
    failing.lock().unwrap().insert(1);
    let log = store.log();
    let mut cache = TileCache::initialize(store, test_config()).unwrap();

    let items: Vec<_> = (0..3).map(|x| (tile(x), tile_payload(tile(x)))).collect();
    assert_eq!(cache.batch_upload(&items), 2);
    assert_eq!(log.lock().unwrap().uploads.len(), 3);
    assert_eq!(cache.stats().used_slots, 3);
}

#[test]
fn test_update_does_not_promote() {
    let mut cache = host_cache(2);
    let a = cache.request_tile(tile(0), None).unwrap();
    cache.request_tile(tile(1), None).unwrap();

    cache
        .update_tile_data(a, Bytes::from(vec![9u8; TEST_TILE_BYTES]))
        .unwrap();
    cache.request_tile(tile(2), None).unwrap();

    assert!(!cache.contains(&tile(0)));
}

// =============================================================================
// Statistics
// =============================================================================

#[test]
fn test_statistics_readable_while_cache_mutates() {
    let mut cache = host_cache(32);
    let stats = cache.statistics();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let stats = Arc::clone(&stats);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let mut last_misses = 0;
            while !done.load(Ordering::SeqCst) {
                let snapshot = stats.snapshot();
                assert!(snapshot.miss_count >= last_misses);
                assert!(snapshot.used_slots <= 32);
                last_misses = snapshot.miss_count;
            }
        })
    };

    for i in 0..10_000u32 {
        cache.request_tile(tile(i % 64), None).unwrap();
    }
    done.store(true, Ordering::SeqCst);
    reader.join().unwrap();

    assert_eq!(stats.hit_count() + stats.miss_count(), 10_000);
    assert_eq!(stats.total_slots(), 32);
}

#[test]
fn test_stats_snapshot_json() {
    let mut cache = host_cache(2);
    cache.request_tile(tile(0), None).unwrap();
    cache.request_tile(tile(0), None).unwrap();

    let json = serde_json::to_value(cache.stats()).unwrap();
    assert_eq!(json["hit_count"], 1);
    assert_eq!(json["miss_count"], 1);
    assert_eq!(json["used_slots"], 1);
    assert_eq!(json["total_slots"], 2);
}

#[test]
fn test_shutdown_then_request_fails() {
    let mut cache = TileCache::initialize(HostMemoryStore::with_max_slots(2), test_config()).unwrap();
    cache.shutdown();
    assert_eq!(cache.request_tile(tile(0), None), Err(CacheError::NoCapacity));
    assert_eq!(cache.stats().miss_count, 0);
}
