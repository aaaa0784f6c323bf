//! Pre-computed row/column geometry.
//!
//! Cumulative column offsets are computed once from configuration and
//! reused for every geometry query, enabling O(log n) column lookup by
//! pixel position. Rows are uniform height, so row lookup is a division.

use crate::config::GridConfig;

/// Pre-computed geometry for the whole grid.
#[derive(Debug, Clone)]
pub struct GridLayout {
    /// Cumulative column positions (`col_positions[i]` = x of column i's
    /// left edge; final entry = total width). Strictly increasing since
    /// every column width is positive.
    col_positions: Vec<f32>,
    row_height: f32,
    total_rows: u32,
    total_columns: u32,
}

impl GridLayout {
    /// Build the layout from a validated configuration.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        let mut col_positions = Vec::with_capacity(config.columns.len() + 1);
        let mut x: f32 = 0.0;
        col_positions.push(x);
        for col in &config.columns {
            x += col.width;
            col_positions.push(x);
        }
        Self {
            col_positions,
            row_height: config.row_height,
            total_rows: config.total_rows,
            total_columns: config.total_columns,
        }
    }

    /// X position of a column's left edge.
    #[must_use]
    pub fn col_x(&self, col: u32) -> f32 {
        self.col_positions.get(col as usize).copied().unwrap_or(0.0)
    }

    /// Width of a column (0 for out-of-range indices).
    #[must_use]
    pub fn col_width(&self, col: u32) -> f32 {
        let left = self.col_positions.get(col as usize);
        let right = self.col_positions.get(col as usize + 1);
        match (left, right) {
            (Some(l), Some(r)) => r - l,
            _ => 0.0,
        }
    }

    /// Y position of a row's top edge.
    #[must_use]
    pub fn row_y(&self, row: u32) -> f32 {
        row as f32 * self.row_height
    }

    #[must_use]
    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    #[must_use]
    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    #[must_use]
    pub fn total_columns(&self) -> u32 {
        self.total_columns
    }

    /// Total content width.
    #[must_use]
    pub fn total_width(&self) -> f32 {
        self.col_positions.last().copied().unwrap_or(0.0)
    }

    /// Total content height.
    #[must_use]
    pub fn total_height(&self) -> f32 {
        self.total_rows as f32 * self.row_height
    }

    /// Row containing a y position, clamped to `total_rows` when the
    /// position lies past the end of content.
    #[must_use]
    pub fn row_at_y(&self, y: f32) -> u32 {
        if y <= 0.0 || self.row_height <= 0.0 {
            return 0;
        }
        ((y / self.row_height) as u32).min(self.total_rows)
    }

    /// Column containing an x position: the first column whose right edge
    /// exceeds `x`. Binary search over the cumulative offsets; clamped to
    /// `total_columns` past the end of content.
    #[must_use]
    pub fn col_at_x(&self, x: f32) -> u32 {
        let right_edges = self.col_positions.get(1..).unwrap_or(&[]);
        let col = right_edges.partition_point(|&right| right <= x) as u32;
        col.min(self.total_columns)
    }

    /// One past the last column whose right edge is below `x`, i.e. the
    /// exclusive end of the column range needed to cover content up to `x`.
    #[must_use]
    pub fn col_end_at_x(&self, x: f32) -> u32 {
        let right_edges = self.col_positions.get(1..).unwrap_or(&[]);
        let covered = right_edges.partition_point(|&right| right < x) as u32;
        (covered + 1).min(self.total_columns)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{ColumnSpec, GridConfig};
    use test_case::test_case;

    fn uniform_layout(rows: u32, cols: u32, row_height: f32, col_width: f32) -> GridLayout {
        let mut config = GridConfig::demo(rows, cols);
        config.row_height = row_height;
        config.columns = (0..cols).map(|i| ColumnSpec::new(i, col_width)).collect();
        GridLayout::new(&config)
    }

    #[test]
    fn test_cumulative_offsets() {
        let mut config = GridConfig::demo(10, 3);
        config.columns = vec![
            ColumnSpec::new(0, 100.0),
            ColumnSpec::new(1, 50.0),
            ColumnSpec::new(2, 200.0),
        ];
        let layout = GridLayout::new(&config);

        assert_eq!(layout.col_x(0), 0.0);
        assert_eq!(layout.col_x(1), 100.0);
        assert_eq!(layout.col_x(2), 150.0);
        assert_eq!(layout.col_width(1), 50.0);
        assert_eq!(layout.total_width(), 350.0);
    }

    #[test_case(0.0, 0; "origin")]
    #[test_case(99.5, 0; "just inside first column")]
    #[test_case(100.0, 1; "boundary belongs to next column")]
    #[test_case(250.0, 2; "mid grid")]
    #[test_case(10_000.0, 10; "past content clamps to total")]
    fn test_col_at_x(x: f32, expected: u32) {
        let layout = uniform_layout(100, 10, 20.0, 100.0);
        assert_eq!(layout.col_at_x(x), expected);
    }

    #[test_case(0.0, 0; "origin")]
    #[test_case(10.0, 0; "inside first row")]
    #[test_case(20.0, 1; "boundary")]
    #[test_case(50.0, 2; "mid grid")]
    #[test_case(1e9, 100; "past content clamps to total")]
    fn test_row_at_y(y: f32, expected: u32) {
        let layout = uniform_layout(100, 10, 20.0, 100.0);
        assert_eq!(layout.row_at_y(y), expected);
    }

    #[test]
    fn test_col_end_at_x() {
        let layout = uniform_layout(100, 10, 20.0, 100.0);
        // Content up to x=300 is covered by columns 0..3
        assert_eq!(layout.col_end_at_x(300.0), 3);
        // One pixel more needs column 3 as well
        assert_eq!(layout.col_end_at_x(301.0), 4);
        // Far past the content: every column
        assert_eq!(layout.col_end_at_x(10_000.0), 10);
    }

    #[test]
    fn test_total_height() {
        let layout = uniform_layout(100_000, 10, 50.0, 100.0);
        assert_eq!(layout.total_height(), 5_000_000.0);
    }
}
