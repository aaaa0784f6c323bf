//! Structured error types for vgrid.
//!
//! Store-open failures are fatal to the whole grid; chunk-load and
//! range-fetch failures are recoverable and carry enough context for the
//! orchestrator to clear loading state and retry on a later viewport pass.

/// All errors that can occur in the grid data core.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The embedded store could not be opened or its schema created.
    /// Fatal: surfaced to the caller as a persistent error state.
    #[error("store initialization: {0}")]
    Init(String),

    /// SQLite error from a read query.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// One chunk's population failed; the chunk remains unloaded.
    #[error("chunk load: {0}")]
    ChunkLoad(#[from] ChunkLoadError),

    /// A range read failed; affected cells stay in "loading" state.
    #[error("range fetch: {0}")]
    RangeFetch(#[from] RangeFetchError),

    /// Invalid grid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

/// Failure while populating a single chunk.
///
/// `Clone` so every caller joined on the same in-flight load observes the
/// same failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("chunk {chunk_index}: {message}")]
pub struct ChunkLoadError {
    /// Index of the chunk whose population failed.
    pub chunk_index: u32,
    /// Underlying error, flattened to text.
    pub message: String,
}

impl ChunkLoadError {
    pub(crate) fn new(chunk_index: u32, message: impl Into<String>) -> Self {
        Self {
            chunk_index,
            message: message.into(),
        }
    }
}

/// Failure while reading a cell sub-range.
///
/// `Clone` for the same reason as [`ChunkLoadError`]: deduplicated fetches
/// share one result among all joined callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rows {row_start}..={row_end} cols {col_start}..={col_end}: {message}")]
pub struct RangeFetchError {
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
    /// Underlying error, flattened to text.
    pub message: String,
}
