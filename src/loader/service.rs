//! Per-frame tile loading.
//!
//! ```text
//!   visible tiles
//!        │
//!        ▼
//!  reconcile_visible ──► resident (promoted, drawn as-is)
//!        │
//!        ▼ to_load (deduplicated)
//!  ┌───────────────────────────────┐
//!  │ producer tasks (JoinSet)      │  at most `concurrency` in flight
//!  └───────────────┬───────────────┘
//!                  ▼
//!            batch_upload
//! ```
//!
//! Producers run on spawned tasks that are aborted if the frame is dropped.
//! The cache itself is only touched by the caller, between awaits, through
//! its `&mut` borrow.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::tile::{SlotIndex, SlotStore, TileCache, TileCoordinate};

use super::producer::TileProducer;

/// Default number of tiles produced concurrently.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Outcome of loading one frame's visible tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Visible tiles passed in (including duplicates)
    pub requested: usize,

    /// Visible tiles that were already resident
    pub already_resident: usize,

    /// Distinct tiles the producer returned bytes for
    pub produced: usize,

    /// Produced tiles written to the cache
    pub uploaded: usize,

    /// Distinct tiles that could not be produced or uploaded
    pub failed: usize,
}

impl LoadReport {
    /// Whether every missing tile was loaded.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Loads missing tiles into a [`TileCache`] through a [`TileProducer`].
pub struct TileLoader<P> {
    producer: Arc<P>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl<P> TileLoader<P>
where
    P: TileProducer + 'static,
{
    /// Create a loader running at most `concurrency` producer calls at once.
    ///
    /// A concurrency of 0 is treated as 1.
    pub fn new(producer: Arc<P>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            producer,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn producer(&self) -> &Arc<P> {
        &self.producer
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Bring every visible tile into the cache.
    ///
    /// Resident tiles are promoted. Missing tiles are produced once each, even
    /// if they appear several times in `visible`, and uploaded in the order
    /// they first appear. Failures are logged and counted, never returned.
    pub async fn load_visible<S: SlotStore>(
        &self,
        cache: &mut TileCache<S>,
        visible: &[TileCoordinate],
    ) -> LoadReport {
        let reconciliation = cache.reconcile_visible(visible);
        let mut report = LoadReport {
            requested: visible.len(),
            already_resident: reconciliation.resident.len(),
            ..LoadReport::default()
        };

        let mut seen = HashSet::with_capacity(reconciliation.to_load.len());
        let to_load: Vec<TileCoordinate> = reconciliation
            .to_load
            .into_iter()
            .filter(|coord| seen.insert(*coord))
            .collect();
        if to_load.is_empty() {
            return report;
        }

        let mut items: Vec<(TileCoordinate, Bytes)> = Vec::with_capacity(to_load.len());
        for (coord, result) in self.produce_all(&to_load).await {
            match result {
                Ok(data) => items.push((coord, data)),
                Err(e) => {
                    warn!(tile = %coord, error = %e, "Failed to produce tile");
                    report.failed += 1;
                }
            }
        }

        report.produced = items.len();
        report.uploaded = cache.batch_upload(&items);
        report.failed += report.produced - report.uploaded;

        debug!(
            requested = report.requested,
            resident = report.already_resident,
            uploaded = report.uploaded,
            failed = report.failed,
            "Loaded visible tiles"
        );
        report
    }

    /// Make a single tile resident and return its slot.
    ///
    /// A resident tile counts as a hit and is promoted without calling the
    /// producer.
    pub async fn load_tile<S: SlotStore>(
        &self,
        cache: &mut TileCache<S>,
        coord: TileCoordinate,
    ) -> Result<SlotIndex, LoadError> {
        if cache.contains(&coord) {
            return Ok(cache.request_tile(coord, None)?);
        }

        let data = self.producer.produce(coord).await?;
        Ok(cache.request_tile(coord, Some(data))?)
    }

    /// Produce `coords` concurrently, returning results in input order.
    ///
    /// Tasks live in a [`JoinSet`], so dropping this future aborts every
    /// producer still running.
    async fn produce_all(
        &self,
        coords: &[TileCoordinate],
    ) -> Vec<(TileCoordinate, Result<Bytes, LoadError>)> {
        let mut tasks = JoinSet::new();
        for (position, &coord) in coords.iter().enumerate() {
            let producer = Arc::clone(&self.producer);
            let semaphore = Arc::clone(&self.semaphore);
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => producer.produce(coord).await.map_err(LoadError::from),
                    Err(_) => Err(LoadError::TaskFailed(coord)),
                };
                (position, result)
            });
        }

        let mut slots: Vec<Option<Result<Bytes, LoadError>>> =
            std::iter::repeat_with(|| None).take(coords.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, result)) => slots[position] = Some(result),
                Err(e) => warn!(error = %e, "Producer task failed"),
            }
        }

        coords
            .iter()
            .zip(slots)
            .map(|(&coord, slot)| {
                (coord, slot.unwrap_or_else(|| Err(LoadError::TaskFailed(coord))))
            })
            .collect()
    }
}
