//! Persistent chunk store backed by an embedded SQLite database.
//!
//! Cells live in one key-value table keyed by `(row_index, column_index)`;
//! a single metadata row tracks the persisted-row high-water mark. Chunks
//! of [`CHUNK_SIZE`](crate::generator::CHUNK_SIZE) rows are populated in
//! one transaction each, so a chunk is never observable partially loaded.
//!
//! The store handle is an explicit object owned by the caller (no
//! module-level singleton) and is cheap to clone; clones share the same
//! connection, loaded-chunk set and in-flight load registry.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::config::GridConfig;
use crate::error::{ChunkLoadError, GridError, Result};
use crate::generator::{self, chunk_end_row, chunk_start_row, total_chunks, CHUNK_SIZE};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS grid_cells (
    row_index    INTEGER NOT NULL,
    column_index INTEGER NOT NULL,
    value        TEXT    NOT NULL,
    PRIMARY KEY (row_index, column_index)
);
CREATE INDEX IF NOT EXISTS idx_row ON grid_cells(row_index);
CREATE INDEX IF NOT EXISTS idx_column ON grid_cells(column_index);
CREATE TABLE IF NOT EXISTS metadata (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const PROGRESS_KEY: &str = "loaded_rows";

type SharedLoad = Shared<BoxFuture<'static, std::result::Result<(), ChunkLoadError>>>;

/// Handle to the persistent cell store.
#[derive(Clone)]
pub struct ChunkStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    conn: Mutex<Connection>,
    /// Chunk indices whose full population is persisted. Mirrors the
    /// database; rebuilt on open.
    loaded: Mutex<HashSet<u32>>,
    /// At-most-one population per chunk index: later callers join the
    /// shared future registered here instead of starting a duplicate.
    in_flight: Mutex<HashMap<u32, SharedLoad>>,
    /// Persisted-row high-water mark, mirroring the metadata row.
    progress: Mutex<u32>,
    /// Diagnostic: number of population passes actually executed.
    populations: AtomicU64,
    total_rows: u32,
    total_columns: u32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChunkStore {
    /// Open (or create) a store on disk.
    ///
    /// Idempotent: schema creation uses `IF NOT EXISTS` and an existing
    /// database is re-adopted, with the loaded-chunk set rebuilt from the
    /// persisted rows.
    ///
    /// # Errors
    /// Returns [`GridError::Init`] if the database cannot be opened or
    /// its schema created.
    pub fn open(path: impl AsRef<Path>, config: &GridConfig) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| GridError::Init(e.to_string()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| GridError::Init(e.to_string()))?;
        Self::from_connection(conn, config)
    }

    /// Open an in-memory store (used by tests and previews).
    ///
    /// # Errors
    /// Returns [`GridError::Init`] if the database cannot be opened.
    pub fn open_in_memory(config: &GridConfig) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| GridError::Init(e.to_string()))?;
        Self::from_connection(conn, config)
    }

    fn from_connection(conn: Connection, config: &GridConfig) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| GridError::Init(e.to_string()))?;

        let progress = read_progress(&conn).map_err(|e| GridError::Init(e.to_string()))?;
        let loaded = rebuild_loaded_set(&conn, config.total_rows, config.total_columns)
            .map_err(|e| GridError::Init(e.to_string()))?;

        info!(
            loaded_rows = progress,
            loaded_chunks = loaded.len(),
            "chunk store opened"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                loaded: Mutex::new(loaded),
                in_flight: Mutex::new(HashMap::new()),
                progress: Mutex::new(progress),
                populations: AtomicU64::new(0),
                total_rows: config.total_rows,
                total_columns: config.total_columns,
            }),
        })
    }

    /// Populate one chunk, persisting all of its cells in a single
    /// transaction.
    ///
    /// No-op if the chunk is already loaded. If a load for the same index
    /// is in flight, the caller joins it instead of starting a duplicate;
    /// every joined caller observes the same success or failure.
    ///
    /// # Errors
    /// Returns a cloneable [`ChunkLoadError`]; the chunk stays unloaded
    /// and may be re-requested.
    pub async fn load_chunk(&self, chunk_index: u32) -> std::result::Result<(), ChunkLoadError> {
        if chunk_index >= total_chunks(self.inner.total_rows) {
            return Err(ChunkLoadError::new(chunk_index, "chunk index out of range"));
        }
        if self.is_chunk_loaded(chunk_index) {
            debug!(chunk_index, "chunk already loaded");
            return Ok(());
        }

        let load = {
            let mut in_flight = lock(&self.inner.in_flight);
            if let Some(existing) = in_flight.get(&chunk_index) {
                debug!(chunk_index, "joining in-flight chunk load");
                existing.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let load = async move {
                    // Yield once so concurrent requesters registered in the
                    // same tick join this future before the blocking write.
                    tokio::task::yield_now().await;
                    inner.populate_chunk(chunk_index)
                }
                .boxed()
                .shared();
                in_flight.insert(chunk_index, load.clone());
                load
            }
        };

        let result = load.await;
        lock(&self.inner.in_flight).remove(&chunk_index);
        result
    }

    /// Read-only range query, bounds inclusive (matching the SQL
    /// `BETWEEN` of the original table). Returns only persisted cells;
    /// absent cells are omitted, never an error.
    ///
    /// # Errors
    /// Returns the underlying SQLite error if the query itself fails.
    pub fn cells_in_range(
        &self,
        start_row: u32,
        end_row: u32,
        start_col: u32,
        end_col: u32,
    ) -> Result<HashMap<(u32, u32), String>> {
        let conn = lock(&self.inner.conn);
        let mut stmt = conn.prepare_cached(
            "SELECT row_index, column_index, value
             FROM grid_cells
             WHERE row_index BETWEEN ?1 AND ?2
               AND column_index BETWEEN ?3 AND ?4",
        )?;

        let rows = stmt.query_map(params![start_row, end_row, start_col, end_col], |r| {
            Ok(((r.get::<_, u32>(0)?, r.get::<_, u32>(1)?), r.get::<_, String>(2)?))
        })?;

        let mut cells = HashMap::new();
        for row in rows {
            let ((row_index, column_index), value) = row?;
            cells.insert((row_index, column_index), value);
        }
        Ok(cells)
    }

    /// O(1) check against the in-memory loaded-chunk set.
    #[must_use]
    pub fn is_chunk_loaded(&self, chunk_index: u32) -> bool {
        lock(&self.inner.loaded).contains(&chunk_index)
    }

    /// Monotonic persisted-row high-water mark.
    #[must_use]
    pub fn loading_progress(&self) -> u32 {
        *lock(&self.inner.progress)
    }

    /// Number of fully persisted chunks.
    #[must_use]
    pub fn loaded_chunk_count(&self) -> u32 {
        lock(&self.inner.loaded).len() as u32
    }

    /// Number of population passes actually executed since open.
    /// Deduplicated and already-loaded requests do not count.
    #[must_use]
    pub fn population_count(&self) -> u64 {
        self.inner.populations.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total_rows(&self) -> u32 {
        self.inner.total_rows
    }

    #[must_use]
    pub fn total_columns(&self) -> u32 {
        self.inner.total_columns
    }

    /// Delete all cells and metadata and reset in-memory state.
    ///
    /// # Errors
    /// Returns the underlying SQLite error if the deletes fail.
    pub fn clear(&self) -> Result<()> {
        {
            let conn = lock(&self.inner.conn);
            conn.execute_batch("DELETE FROM grid_cells; DELETE FROM metadata;")?;
        }
        lock(&self.inner.loaded).clear();
        *lock(&self.inner.progress) = 0;
        info!("chunk store cleared");
        Ok(())
    }
}

impl StoreInner {
    /// Generate and persist every cell of a chunk, then advance the
    /// progress high-water mark and mark the chunk loaded. All writes
    /// happen in one transaction: the chunk becomes visible atomically
    /// or not at all.
    fn populate_chunk(&self, chunk_index: u32) -> std::result::Result<(), ChunkLoadError> {
        let db_err = |e: rusqlite::Error| ChunkLoadError::new(chunk_index, e.to_string());

        let started = Instant::now();
        let cells = generator::generate_chunk(chunk_index, self.total_rows, self.total_columns);
        let row_count = chunk_end_row(chunk_index, self.total_rows) - chunk_start_row(chunk_index);

        // Held across the commit: the high-water read-modify-write must
        // stay atomic with respect to parallel populations, or a slower
        // writer could commit a stale smaller value. No await points in
        // this function.
        let mut progress = lock(&self.progress);
        let new_progress = (*progress).max(((chunk_index + 1) * CHUNK_SIZE).min(self.total_rows));

        {
            let mut conn = lock(&self.conn);
            let tx = conn.transaction().map_err(db_err)?;
            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT OR REPLACE INTO grid_cells (row_index, column_index, value)
                         VALUES (?1, ?2, ?3)",
                    )
                    .map_err(db_err)?;
                for cell in &cells {
                    stmt.execute(params![cell.row_index, cell.column_index, cell.value])
                        .map_err(db_err)?;
                }
            }
            tx.execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
                params![PROGRESS_KEY, new_progress.to_string()],
            )
            .map_err(db_err)?;
            tx.commit().map_err(db_err)?;
        }

        *progress = new_progress;
        drop(progress);

        lock(&self.loaded).insert(chunk_index);
        self.populations.fetch_add(1, Ordering::Relaxed);

        info!(
            chunk_index,
            rows = row_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chunk loaded"
        );
        Ok(())
    }
}

fn read_progress(conn: &Connection) -> rusqlite::Result<u32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            params![PROGRESS_KEY],
            |r| r.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

/// A chunk counts as loaded iff its full `rows × columns` cell count is
/// present. One grouped query covers all chunks.
fn rebuild_loaded_set(
    conn: &Connection,
    total_rows: u32,
    total_columns: u32,
) -> rusqlite::Result<HashSet<u32>> {
    let mut stmt = conn.prepare(
        "SELECT row_index / ?1 AS chunk_index, COUNT(*)
         FROM grid_cells
         GROUP BY chunk_index",
    )?;
    let rows = stmt.query_map(params![CHUNK_SIZE], |r| {
        Ok((r.get::<_, u32>(0)?, r.get::<_, u64>(1)?))
    })?;

    let total = total_chunks(total_rows);
    let mut loaded = HashSet::new();
    for row in rows {
        let (chunk_index, count) = row?;
        // Rows past the configured grid (foreign or stale database)
        if chunk_index >= total {
            continue;
        }
        let expected = u64::from(chunk_end_row(chunk_index, total_rows) - chunk_start_row(chunk_index))
            * u64::from(total_columns);
        if expected > 0 && count >= expected {
            loaded.insert(chunk_index);
        }
    }
    Ok(loaded)
}
