//! Core data types shared across the grid modules.

use serde::{Deserialize, Serialize};

/// A single (row, column) addressable unit of grid data.
///
/// Identity is `(row_index, column_index)`; values are deterministic
/// functions of their coordinates in this demo, so cells are immutable
/// once written and re-generation is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row_index: u32,
    pub column_index: u32,
    pub value: String,
    /// True once the cell has been read back from the persisted store.
    pub is_loaded: bool,
}

/// Snapshot of how much of the grid has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingProgress {
    /// Monotonically non-decreasing count of rows persisted.
    pub loaded_rows: u32,
    pub total_rows: u32,
    pub loaded_chunks: u32,
    pub total_chunks: u32,
}

impl LoadingProgress {
    /// Fraction of rows persisted, in `0.0..=1.0`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.total_rows == 0 {
            return 1.0;
        }
        self.loaded_rows as f32 / self.total_rows as f32
    }

    /// True once every chunk has been persisted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.loaded_chunks >= self.total_chunks
    }
}
