//! Merging of fine and coarse tiers into one authoritative grid per tile.

use crate::cache::GridCache;
use crate::source::{DemTier, GridSource};
use crate::{DemError, ElevationGrid, Result, TileCoord};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

type PendingGrid = Shared<BoxFuture<'static, Option<Arc<ElevationGrid>>>>;

struct MergerState {
    cache: Mutex<GridCache>,
    /// Merges currently being fetched, so concurrent callers share one upstream round.
    in_flight: Mutex<HashMap<TileCoord, PendingGrid>>,
}

/// Produces merged grids, memoized in a bounded cache.
///
/// The fine tier is authoritative: when it is missing the whole tile is absent,
/// even if the coarse tier has data. Otherwise every no-data cell of the fine
/// grid is filled from the coarse grid when one exists.
///
/// Concurrent requests for the same tile are coalesced into a single pair of
/// upstream fetches.
#[derive(Clone)]
pub struct GridMerger {
    source: Arc<dyn GridSource>,
    state: Arc<MergerState>,
}

impl fmt::Debug for GridMerger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridMerger").finish_non_exhaustive()
    }
}

impl GridMerger {
    /// Create a merger over `source` caching at most `cache_capacity` grids.
    pub fn new(source: Arc<dyn GridSource>, cache_capacity: usize) -> Self {
        Self {
            source,
            state: Arc::new(MergerState {
                cache: Mutex::new(GridCache::new(cache_capacity)),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The merged grid governing `tile`, or `None` when the fine tier has no data.
    ///
    /// Absent results are not cached.
    pub async fn merged_grid(&self, tile: TileCoord) -> Result<Option<Arc<ElevationGrid>>> {
        let pending = {
            let mut in_flight = self
                .state
                .in_flight
                .lock()
                .map_err(|_| DemError::CacheLockPoisoned)?;

            if let Some(pending) = in_flight.get(&tile) {
                trace!(%tile, "Joining in-flight merge");
                pending.clone()
            } else {
                let cached = self
                    .state
                    .cache
                    .lock()
                    .map_err(|_| DemError::CacheLockPoisoned)?
                    .get(&tile);
                if let Some(grid) = cached {
                    trace!(%tile, "Grid cache hit");
                    return Ok(Some(grid));
                }

                let pending = self.spawn_merge(tile);
                in_flight.insert(tile, pending.clone());
                pending
            }
        };

        Ok(pending.await)
    }

    /// Number of grids currently cached.
    pub fn cached_grids(&self) -> usize {
        self.state.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    fn spawn_merge(&self, tile: TileCoord) -> PendingGrid {
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);

        let pending = async move {
            let grid = fetch_and_merge(source.as_ref(), tile).await;

            // Cache first so a caller that misses the in-flight entry hits the cache.
            if let Some(grid) = &grid {
                if let Ok(mut cache) = state.cache.lock() {
                    let evicted = cache.insert(tile, Arc::clone(grid));
                    if !evicted.is_empty() {
                        debug!(%tile, evicted = evicted.len(), "Evicted cached grids");
                    }
                }
            }
            if let Ok(mut in_flight) = state.in_flight.lock() {
                in_flight.remove(&tile);
            }

            grid
        }
        .boxed()
        .shared();

        // Drive to completion even if every caller goes away.
        tokio::spawn(pending.clone());
        pending
    }
}

async fn fetch_and_merge(source: &dyn GridSource, tile: TileCoord) -> Option<Arc<ElevationGrid>> {
    let fine = async {
        source
            .fetch(tile, DemTier::Fine)
            .await
            .ok_or(DemTier::Fine)
    };
    let coarse = async { Ok::<_, DemTier>(source.fetch(tile, DemTier::Coarse).await) };

    match tokio::try_join!(fine, coarse) {
        Ok((fine, coarse)) => {
            debug!(
                %tile,
                fine_cells = fine.present_cells(),
                has_coarse = coarse.is_some(),
                "Merging DEM tiers"
            );
            Some(Arc::new(ElevationGrid::merge(&fine, coarse.as_ref())))
        }
        Err(_) => {
            debug!(%tile, "No fine tier data, tile is absent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSource {
        fine: Option<ElevationGrid>,
        coarse: Option<ElevationGrid>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl GridSource for CountingSource {
        async fn fetch(&self, _tile: TileCoord, tier: DemTier) -> Option<ElevationGrid> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            match tier {
                DemTier::Fine => self.fine.clone(),
                DemTier::Coarse => self.coarse.clone(),
            }
        }
    }

    fn grid_with(row: usize, col: usize, value: f64) -> ElevationGrid {
        let mut grid = ElevationGrid::empty();
        grid.set(row, col, Some(value));
        grid
    }

    fn tile() -> TileCoord {
        TileCoord::new(12, 3638, 1612).unwrap()
    }

    #[tokio::test]
    async fn test_fine_wins_and_coarse_fills() {
        let mut fine = grid_with(0, 0, 10.0);
        fine.set(1, 1, Some(11.0));
        let mut coarse = grid_with(0, 0, 99.0);
        coarse.set(2, 2, Some(22.0));

        let merger = GridMerger::new(
            Arc::new(CountingSource {
                fine: Some(fine),
                coarse: Some(coarse),
                ..Default::default()
            }),
            4,
        );

        let grid = merger.merged_grid(tile()).await.unwrap().unwrap();
        assert_eq!(grid.get(0, 0), Some(10.0));
        assert_eq!(grid.get(1, 1), Some(11.0));
        assert_eq!(grid.get(2, 2), Some(22.0));
        assert_eq!(grid.get(3, 3), None);
    }

    #[tokio::test]
    async fn test_coarse_alone_is_absent() {
        let source = Arc::new(CountingSource {
            coarse: Some(grid_with(0, 0, 5.0)),
            ..Default::default()
        });
        let merger = GridMerger::new(source, 4);
        assert!(merger.merged_grid(tile()).await.unwrap().is_none());
        assert_eq!(merger.cached_grids(), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream() {
        let source = Arc::new(CountingSource {
            fine: Some(grid_with(0, 0, 1.0)),
            ..Default::default()
        });
        let merger = GridMerger::new(source.clone(), 4);

        merger.merged_grid(tile()).await.unwrap();
        let after_first = source.fetches.load(Ordering::SeqCst);
        assert_eq!(after_first, 2);

        merger.merged_grid(tile()).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), after_first);
        assert_eq!(merger.cached_grids(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let source = Arc::new(CountingSource {
            fine: Some(grid_with(4, 4, 4.0)),
            ..Default::default()
        });
        let merger = GridMerger::new(source.clone(), 4);

        let (a, b, c) = tokio::join!(
            merger.merged_grid(tile()),
            merger.merged_grid(tile()),
            merger.merged_grid(tile())
        );
        let a = a.unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b.unwrap().unwrap()));
        assert!(Arc::ptr_eq(&a, &c.unwrap().unwrap()));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_absent_result_is_refetched() {
        let source = Arc::new(CountingSource::default());
        let merger = GridMerger::new(source.clone(), 4);

        assert!(merger.merged_grid(tile()).await.unwrap().is_none());
        let after_first = source.fetches.load(Ordering::SeqCst);
        assert!(merger.merged_grid(tile()).await.unwrap().is_none());
        assert!(source.fetches.load(Ordering::SeqCst) > after_first);
    }
}
