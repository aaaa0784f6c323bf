//! Load orchestrator and data-access facade.
//!
//! [`GridData`] is what the presentation layer talks to: it owns the
//! chunk store, the bounded cell cache and the per-cell loading flags,
//! and decides which chunks to load and which cell sub-ranges to fetch
//! for a given viewport. Failures inside background loading are caught
//! here, logged, and converted into cleared loading flags; a later
//! viewport pass naturally retries because the cells are still absent
//! from the cache.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::cache::CellCache;
use crate::config::GridConfig;
use crate::error::{RangeFetchError, Result};
use crate::generator::chunk_for_row;
use crate::layout::GridLayout;
use crate::metrics::ReadTimings;
use crate::store::ChunkStore;
use crate::types::{Cell, LoadingProgress};
use crate::viewport::{Viewport, VisibleRanges};

/// Identity of a sub-range fetch: `(start_row, end_row, start_col,
/// end_col)`, bounds inclusive.
type RangeKey = (u32, u32, u32, u32);

type SharedFetch = Shared<BoxFuture<'static, std::result::Result<Vec<Cell>, RangeFetchError>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Grid data source: viewport-driven chunk loading plus a bounded cache.
pub struct GridData {
    config: GridConfig,
    layout: GridLayout,
    store: ChunkStore,
    cache: Mutex<CellCache>,
    /// Cells with a load pass in flight; consumers show a placeholder
    /// while a cell is here.
    loading_cells: Mutex<HashSet<(u32, u32)>>,
    /// At-most-one fetch per identical sub-range: later requests for the
    /// same range await the registered shared future.
    in_flight_fetches: Mutex<HashMap<RangeKey, SharedFetch>>,
    timings: ReadTimings,
}

impl GridData {
    /// Open a grid backed by an on-disk store.
    ///
    /// # Errors
    /// Returns a configuration error or a fatal store-open error.
    pub fn open(config: GridConfig, path: impl AsRef<Path>) -> Result<Self> {
        config.validate()?;
        let store = ChunkStore::open(path, &config)?;
        Ok(Self::with_store(config, store))
    }

    /// Open a grid backed by an in-memory store.
    ///
    /// # Errors
    /// Returns a configuration error or a fatal store-open error.
    pub fn open_in_memory(config: GridConfig) -> Result<Self> {
        config.validate()?;
        let store = ChunkStore::open_in_memory(&config)?;
        Ok(Self::with_store(config, store))
    }

    fn with_store(config: GridConfig, store: ChunkStore) -> Self {
        let layout = GridLayout::new(&config);
        let cache = CellCache::new(config.cache_capacity);
        Self {
            config,
            layout,
            store,
            cache: Mutex::new(cache),
            loading_cells: Mutex::new(HashSet::new()),
            in_flight_fetches: Mutex::new(HashMap::new()),
            timings: ReadTimings::new(),
        }
    }

    /// Last-known value for a cell, if cached. Touches cache recency.
    #[must_use]
    pub fn get_cell_data(&self, row_index: u32, column_index: u32) -> Option<Cell> {
        lock(&self.cache).get(row_index, column_index).cloned()
    }

    /// True while a load pass covering this cell is in flight.
    #[must_use]
    pub fn is_cell_loading(&self, row_index: u32, column_index: u32) -> bool {
        lock(&self.loading_cells).contains(&(row_index, column_index))
    }

    /// Request a single cell: load its owning chunk if needed, then fetch
    /// the configured margin around it and merge the result into the
    /// cache.
    ///
    /// No-op if the cell is cached, already loading, or out of bounds.
    /// Failures are logged and clear the loading flag so a later pass
    /// retries.
    pub async fn request_cell_data(&self, row_index: u32, column_index: u32) {
        if row_index >= self.config.total_rows || column_index >= self.config.total_columns {
            debug!(row_index, column_index, "cell request out of bounds");
            return;
        }
        if lock(&self.cache).has(row_index, column_index) {
            return;
        }
        if !lock(&self.loading_cells).insert((row_index, column_index)) {
            return;
        }

        let outcome = self.load_around_cell(row_index, column_index).await;
        if let Err(e) = outcome {
            warn!(row_index, column_index, error = %e, "cell load failed");
        }
        lock(&self.loading_cells).remove(&(row_index, column_index));
    }

    /// Make a viewport's render ranges resident: load every not-yet-loaded
    /// chunk the rows touch, then fetch the margin-padded sub-range and
    /// merge it into the cache.
    ///
    /// Failures are logged and clear the loading flags for the affected
    /// cells; the orchestrator itself never fails.
    pub async fn ensure_visible(&self, rows: Range<u32>, cols: Range<u32>) {
        let rows = rows.start.min(self.config.total_rows)..rows.end.min(self.config.total_rows);
        let cols =
            cols.start.min(self.config.total_columns)..cols.end.min(self.config.total_columns);
        if rows.is_empty() || cols.is_empty() {
            return;
        }

        let marked = self.mark_loading(&rows, &cols);

        let first_chunk = chunk_for_row(rows.start);
        let last_chunk = chunk_for_row(rows.end - 1);
        for chunk_index in first_chunk..=last_chunk {
            if self.store.is_chunk_loaded(chunk_index) {
                continue;
            }
            if let Err(e) = self.store.load_chunk(chunk_index).await {
                warn!(error = %e, "chunk load failed");
            }
        }

        let (row_start, row_end) = self.pad_rows(rows.start, rows.end - 1);
        let (col_start, col_end) = self.pad_cols(cols.start, cols.end - 1);
        match self.fetch_range(row_start, row_end, col_start, col_end).await {
            Ok(cells) => lock(&self.cache).set_many(cells),
            Err(e) => warn!(error = %e, "range fetch failed"),
        }

        let mut loading = lock(&self.loading_cells);
        for key in marked {
            loading.remove(&key);
        }
    }

    /// Convenience for [`GridData::ensure_visible`] over computed render
    /// ranges.
    pub async fn ensure_ranges(&self, ranges: &VisibleRanges) {
        self.ensure_visible(ranges.render_rows.clone(), ranges.render_cols.clone())
            .await;
    }

    /// Compute visible/render ranges for a viewport against this grid's
    /// layout and overscan configuration.
    #[must_use]
    pub fn compute_ranges(&self, viewport: &Viewport) -> VisibleRanges {
        viewport.compute_ranges(&self.layout, &self.config)
    }

    /// Current loading progress for UI display.
    #[must_use]
    pub fn loading_progress(&self) -> LoadingProgress {
        LoadingProgress {
            loaded_rows: self.store.loading_progress(),
            total_rows: self.config.total_rows,
            loaded_chunks: self.store.loaded_chunk_count(),
            total_chunks: crate::generator::total_chunks(self.config.total_rows),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Handle to the underlying chunk store (shared state).
    #[must_use]
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Number of cells currently cached.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        lock(&self.cache).len()
    }

    /// Rolling average of recent store read durations.
    #[must_use]
    pub fn average_read_time(&self) -> Option<std::time::Duration> {
        self.timings.average()
    }

    /// Drop all persisted cells and cached state.
    ///
    /// # Errors
    /// Returns the underlying store error if the deletes fail.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        lock(&self.cache).clear();
        lock(&self.loading_cells).clear();
        Ok(())
    }

    async fn load_around_cell(&self, row_index: u32, column_index: u32) -> Result<()> {
        let chunk_index = chunk_for_row(row_index);
        self.store.load_chunk(chunk_index).await?;

        let (row_start, row_end) = self.pad_rows(row_index, row_index);
        let (col_start, col_end) = self.pad_cols(column_index, column_index);
        let cells = self.fetch_range(row_start, row_end, col_start, col_end).await?;
        lock(&self.cache).set_many(cells);
        Ok(())
    }

    /// Fetch a cell sub-range from the store, deduplicating identical
    /// concurrent fetches through the in-flight registry.
    async fn fetch_range(
        &self,
        row_start: u32,
        row_end: u32,
        col_start: u32,
        col_end: u32,
    ) -> std::result::Result<Vec<Cell>, RangeFetchError> {
        let key: RangeKey = (row_start, row_end, col_start, col_end);

        let fetch = {
            let mut in_flight = lock(&self.in_flight_fetches);
            if let Some(existing) = in_flight.get(&key) {
                debug!(?key, "joining in-flight range fetch");
                existing.clone()
            } else {
                let store = self.store.clone();
                let timings = self.timings.clone();
                let fetch = async move {
                    // Yield once so concurrent requesters registered in the
                    // same tick join this future before the blocking read.
                    tokio::task::yield_now().await;
                    let started = Instant::now();
                    let cells = store
                        .cells_in_range(row_start, row_end, col_start, col_end)
                        .map_err(|e| RangeFetchError {
                            row_start,
                            row_end,
                            col_start,
                            col_end,
                            message: e.to_string(),
                        })?;
                    timings.record(started.elapsed());
                    Ok(cells
                        .into_iter()
                        .map(|((row_index, column_index), value)| Cell {
                            row_index,
                            column_index,
                            value,
                            is_loaded: true,
                        })
                        .collect())
                }
                .boxed()
                .shared();
                in_flight.insert(key, fetch.clone());
                fetch
            }
        };

        let result = fetch.await;
        lock(&self.in_flight_fetches).remove(&key);
        result
    }

    /// Flag every uncached cell in the ranges as loading; returns the
    /// flagged keys so the caller can clear exactly what it set.
    fn mark_loading(&self, rows: &Range<u32>, cols: &Range<u32>) -> Vec<(u32, u32)> {
        let cache = lock(&self.cache);
        let mut loading = lock(&self.loading_cells);
        let mut marked = Vec::new();
        for row in rows.clone() {
            for col in cols.clone() {
                if !cache.has(row, col) && loading.insert((row, col)) {
                    marked.push((row, col));
                }
            }
        }
        marked
    }

    /// Inclusive row bounds padded by the configured fetch margin.
    fn pad_rows(&self, first: u32, last: u32) -> (u32, u32) {
        let start = first.saturating_sub(self.config.fetch_margin_rows);
        let end = last
            .saturating_add(self.config.fetch_margin_rows)
            .min(self.config.total_rows - 1);
        (start, end)
    }

    /// Inclusive column bounds padded by the configured fetch margin.
    fn pad_cols(&self, first: u32, last: u32) -> (u32, u32) {
        let start = first.saturating_sub(self.config.fetch_margin_cols);
        let end = last
            .saturating_add(self.config.fetch_margin_cols)
            .min(self.config.total_columns - 1);
        (start, end)
    }
}
