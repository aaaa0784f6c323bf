//! Static grid configuration.
//!
//! The demo grid is 100,000 rows × 100 columns; totals, row height,
//! per-column widths and overscan counts all come from configuration
//! (typically a JSON document shipped with the app) rather than being
//! baked into the geometry code.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Default number of cached cells.
pub const DEFAULT_CACHE_CAPACITY: usize = 5_000;

/// Default column width in pixels.
pub const DEFAULT_COL_WIDTH: f32 = 150.0;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f32 = 40.0;

/// A single column definition: fixed width plus a display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub index: u32,
    pub width: f32,
    #[serde(default)]
    pub label: String,
}

impl ColumnSpec {
    /// Create a column with the default `Col N` label.
    #[must_use]
    pub fn new(index: u32, width: f32) -> Self {
        Self {
            index,
            width,
            label: format!("Col {index}"),
        }
    }
}

/// Full grid configuration consumed by the viewport calculator and the
/// load orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub total_rows: u32,
    pub total_columns: u32,
    pub row_height: f32,
    pub columns: Vec<ColumnSpec>,
    /// Extra rows rendered above/below the visible range.
    pub overscan_row_count: u32,
    /// Extra columns rendered left/right of the visible range.
    pub overscan_column_count: u32,
    /// Rows fetched around a requested cell, on each side.
    pub fetch_margin_rows: u32,
    /// Columns fetched around a requested cell, on each side.
    pub fetch_margin_cols: u32,
    /// Maximum number of cells held in the in-memory cache.
    pub cache_capacity: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::demo(100_000, 100)
    }
}

impl GridConfig {
    /// Build a uniform demo configuration: `Col N` labels, default column
    /// width and row height.
    #[must_use]
    pub fn demo(total_rows: u32, total_columns: u32) -> Self {
        let columns = (0..total_columns)
            .map(|i| ColumnSpec::new(i, DEFAULT_COL_WIDTH))
            .collect();
        Self {
            total_rows,
            total_columns,
            row_height: DEFAULT_ROW_HEIGHT,
            columns,
            overscan_row_count: 5,
            overscan_column_count: 2,
            fetch_margin_rows: 10,
            fetch_margin_cols: 5,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Parse a configuration from its JSON representation.
    ///
    /// # Errors
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants: positive dimensions, positive widths,
    /// and a column list that covers exactly `total_columns` entries.
    ///
    /// # Errors
    /// Returns [`GridError::Config`] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.total_rows == 0 {
            return Err(GridError::Config("total_rows must be > 0".into()));
        }
        if self.total_columns == 0 {
            return Err(GridError::Config("total_columns must be > 0".into()));
        }
        if self.row_height <= 0.0 {
            return Err(GridError::Config("row_height must be > 0".into()));
        }
        if self.columns.len() != self.total_columns as usize {
            return Err(GridError::Config(format!(
                "expected {} columns, got {}",
                self.total_columns,
                self.columns.len()
            )));
        }
        for col in &self.columns {
            if col.width <= 0.0 {
                return Err(GridError::Config(format!(
                    "column {} width must be > 0",
                    col.index
                )));
            }
        }
        Ok(())
    }

    /// Width of a column, falling back to the default for out-of-range
    /// indices.
    #[must_use]
    pub fn column_width(&self, index: u32) -> f32 {
        self.columns
            .get(index as usize)
            .map_or(DEFAULT_COL_WIDTH, |c| c.width)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_config_is_valid() {
        let config = GridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_rows, 100_000);
        assert_eq!(config.total_columns, 100);
        assert_eq!(config.columns.len(), 100);
    }

    #[test]
    fn test_rejects_zero_rows() {
        let mut config = GridConfig::demo(10, 2);
        config.total_rows = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_column_count_mismatch() {
        let mut config = GridConfig::demo(10, 4);
        config.columns.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_width() {
        let mut config = GridConfig::demo(10, 2);
        config.columns[1].width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_with_defaults() {
        let config = GridConfig::from_json(r#"{}"#).unwrap();
        assert_eq!(config, GridConfig::default());
    }

    #[test]
    fn test_from_json_custom() {
        let json = r#"{
            "total_rows": 2000,
            "total_columns": 2,
            "row_height": 50.0,
            "columns": [
                { "index": 0, "width": 100.0, "label": "A" },
                { "index": 1, "width": 200.0 }
            ]
        }"#;
        let config = GridConfig::from_json(json).unwrap();
        assert_eq!(config.total_rows, 2000);
        assert_eq!(config.column_width(1), 200.0);
        assert_eq!(config.columns[1].label, "");
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let json = r#"{ "total_rows": 0 }"#;
        assert!(GridConfig::from_json(json).is_err());
    }
}
