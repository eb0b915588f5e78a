//! Bounded LRU cache of merged grids.

use crate::{ElevationGrid, TileCoord};
use demvt_metrics::{metric_defs, metrics};
use std::collections::HashMap;
use std::sync::Arc;

/// Default number of merged grids to keep.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// LRU cache of merged grids keyed by tile.
///
/// Only grids that exist are cached; an absent fine tier is fetched again on the
/// next request.
#[derive(Debug)]
pub struct GridCache {
    /// Cached grids indexed by tile.
    grids: HashMap<TileCoord, Arc<ElevationGrid>>,
    /// Access order for LRU eviction (most recently used at the back).
    access_order: Vec<TileCoord>,
    /// Maximum number of grids held at once.
    capacity: usize,
}

impl GridCache {
    /// Create an empty cache holding at most `capacity` grids (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            grids: HashMap::with_capacity(capacity),
            access_order: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Look up a grid and mark it as recently used.
    pub fn get(&mut self, tile: &TileCoord) -> Option<Arc<ElevationGrid>> {
        let grid = self.grids.get(tile).cloned();
        match grid {
            Some(_) => {
                self.touch(tile);
                metrics::counter!(metric_defs::CACHE_HITS.name).increment(1);
            }
            None => metrics::counter!(metric_defs::CACHE_MISSES.name).increment(1),
        }
        grid
    }

    /// Whether `tile` is cached, without affecting recency.
    pub fn contains(&self, tile: &TileCoord) -> bool {
        self.grids.contains_key(tile)
    }

    fn touch(&mut self, tile: &TileCoord) {
        if let Some(pos) = self.access_order.iter().position(|t| t == tile) {
            let key = self.access_order.remove(pos);
            self.access_order.push(key);
        }
    }

    /// Insert a grid, evicting least recently used entries to stay within
    /// capacity. Returns the evicted tiles.
    pub fn insert(&mut self, tile: TileCoord, grid: Arc<ElevationGrid>) -> Vec<TileCoord> {
        if self.grids.insert(tile, grid).is_some() {
            self.touch(&tile);
            return Vec::new();
        }

        let mut evicted = Vec::new();
        while self.grids.len() > self.capacity && !self.access_order.is_empty() {
            let oldest = self.access_order.remove(0);
            self.grids.remove(&oldest);
            evicted.push(oldest);
        }
        self.access_order.push(tile);

        if !evicted.is_empty() {
            metrics::counter!(metric_defs::CACHE_EVICTIONS.name).increment(evicted.len() as u64);
        }
        metrics::gauge!(metric_defs::CACHE_ENTRIES.name).set(self.grids.len() as f64);
        evicted
    }

    /// Number of cached grids.
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Maximum number of cached grids.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every cached grid.
    pub fn clear(&mut self) {
        self.grids.clear();
        self.access_order.clear();
        metrics::gauge!(metric_defs::CACHE_ENTRIES.name).set(0.0);
    }
}

impl Default for GridCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
