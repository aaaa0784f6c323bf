//! Viewport state and visible-range calculation.
//!
//! [`Viewport`] holds the scroll offsets and pixel size fed in by the
//! presentation layer; [`Viewport::compute_ranges`] derives the visible
//! and render (overscan-padded) row/column ranges from it. Ranges are
//! recomputed on demand and never stored as source of truth.

use std::ops::Range;

use crate::config::GridConfig;
use crate::layout::GridLayout;

/// The currently visible rectangular window into the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Horizontal scroll position in content coordinates.
    pub scroll_x: f32,
    /// Vertical scroll position in content coordinates.
    pub scroll_y: f32,
    /// Viewport width in pixels.
    pub width: f32,
    /// Viewport height in pixels.
    pub height: f32,
}

/// Derived row/column ranges, all half-open `[start, end)`.
///
/// The render ranges always contain the visible ranges: they are the
/// visible ranges padded by the configured overscan and clamped to the
/// grid, and are what actually gets materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRanges {
    pub visible_rows: Range<u32>,
    pub visible_cols: Range<u32>,
    pub render_rows: Range<u32>,
    pub render_cols: Range<u32>,
}

impl VisibleRanges {
    /// Ranges for an empty (zero-size) viewport.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            visible_rows: 0..0,
            visible_cols: 0..0,
            render_rows: 0..0,
            render_cols: 0..0,
        }
    }

    /// Number of cells in the render range.
    #[must_use]
    pub fn render_cell_count(&self) -> u64 {
        u64::from(self.render_rows.end - self.render_rows.start)
            * u64::from(self.render_cols.end - self.render_cols.start)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    /// Create a viewport at the origin with zero size; the presentation
    /// layer reports the real size through [`Viewport::resize`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Set absolute scroll position, clamped to the content bounds.
    pub fn set_scroll(&mut self, x: f32, y: f32, layout: &GridLayout) {
        self.scroll_x = x;
        self.scroll_y = y;
        self.clamp_scroll(layout);
    }

    /// Scroll by delta amounts, clamped to the content bounds.
    pub fn scroll_by(&mut self, delta_x: f32, delta_y: f32, layout: &GridLayout) {
        self.set_scroll(self.scroll_x + delta_x, self.scroll_y + delta_y, layout);
    }

    /// Resize the viewport (layout event).
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Clamp scroll position so the viewport never extends past the
    /// content (or before the origin).
    pub fn clamp_scroll(&mut self, layout: &GridLayout) {
        let max_x = (layout.total_width() - self.width).max(0.0);
        let max_y = (layout.total_height() - self.height).max(0.0);
        self.scroll_x = self.scroll_x.clamp(0.0, max_x);
        self.scroll_y = self.scroll_y.clamp(0.0, max_y);
    }

    /// Compute the visible and render ranges for the current scroll
    /// position. Pure: identical inputs produce identical ranges.
    #[must_use]
    pub fn compute_ranges(&self, layout: &GridLayout, config: &GridConfig) -> VisibleRanges {
        if self.width <= 0.0 || self.height <= 0.0 {
            return VisibleRanges::empty();
        }

        let total_rows = layout.total_rows();
        let total_cols = layout.total_columns();

        let visible_row_start = layout.row_at_y(self.scroll_y);
        let visible_row_end = ((self.scroll_y + self.height) / layout.row_height())
            .ceil()
            .max(0.0) as u32;
        let visible_row_end = visible_row_end.clamp(visible_row_start, total_rows);

        let visible_col_start = layout.col_at_x(self.scroll_x);
        let visible_col_end = layout
            .col_end_at_x(self.scroll_x + self.width)
            .max(visible_col_start);

        let render_row_start = visible_row_start.saturating_sub(config.overscan_row_count);
        let render_row_end = visible_row_end
            .saturating_add(config.overscan_row_count)
            .min(total_rows);
        let render_col_start = visible_col_start.saturating_sub(config.overscan_column_count);
        let render_col_end = visible_col_end
            .saturating_add(config.overscan_column_count)
            .min(total_cols);

        VisibleRanges {
            visible_rows: visible_row_start..visible_row_end,
            visible_cols: visible_col_start..visible_col_end,
            render_rows: render_row_start..render_row_end,
            render_cols: render_col_start..render_col_end,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{ColumnSpec, GridConfig};
    use test_case::test_case;

    fn test_config() -> GridConfig {
        // The setup from the reference scenario: 100k rows, 10 columns of
        // width 100, row height 50, overscan 2 rows / 1 column.
        let mut config = GridConfig::demo(100_000, 10);
        config.row_height = 50.0;
        config.columns = (0..10).map(|i| ColumnSpec::new(i, 100.0)).collect();
        config.overscan_row_count = 2;
        config.overscan_column_count = 1;
        config
    }

    fn viewport(scroll_x: f32, scroll_y: f32, width: f32, height: f32) -> Viewport {
        Viewport {
            scroll_x,
            scroll_y,
            width,
            height,
        }
    }

    #[test]
    fn test_ranges_at_origin() {
        let config = test_config();
        let layout = GridLayout::new(&config);
        let ranges = viewport(0.0, 0.0, 300.0, 500.0).compute_ranges(&layout, &config);

        assert_eq!(ranges.visible_rows, 0..10);
        assert_eq!(ranges.render_rows, 0..12);
        // 300px of width covers columns 0..3; one column of overscan
        assert_eq!(ranges.visible_cols, 0..3);
        assert_eq!(ranges.render_cols, 0..4);
    }

    #[test]
    fn test_zero_size_viewport_is_empty() {
        let config = test_config();
        let layout = GridLayout::new(&config);
        let ranges = viewport(0.0, 0.0, 0.0, 0.0).compute_ranges(&layout, &config);
        assert_eq!(ranges, VisibleRanges::empty());
    }

    #[test]
    fn test_scroll_past_content_clamps_to_end() {
        let config = test_config();
        let layout = GridLayout::new(&config);
        // scroll_y far beyond the 5,000,000px of content
        let ranges = viewport(0.0, 1e9, 300.0, 500.0).compute_ranges(&layout, &config);

        assert!(ranges.visible_rows.is_empty());
        assert_eq!(ranges.visible_rows.start, 100_000);
        // Overscan still materializes the last rows
        assert_eq!(ranges.render_rows, 99_998..100_000);
    }

    #[test_case(0.0, 0; "origin")]
    #[test_case(25.0, 0; "mid first row")]
    #[test_case(50.0, 1; "exact row boundary")]
    #[test_case(4_999_950.0, 99_999; "last row")]
    fn test_visible_row_start(scroll_y: f32, expected: u32) {
        let config = test_config();
        let layout = GridLayout::new(&config);
        let ranges = viewport(0.0, scroll_y, 300.0, 500.0).compute_ranges(&layout, &config);
        assert_eq!(ranges.visible_rows.start, expected);
    }

    #[test_case(0.0, 0.0; "origin")]
    #[test_case(123.0, 456.0; "arbitrary offset")]
    #[test_case(950.0, 4_999_700.0; "near end of content")]
    fn test_render_contains_visible(scroll_x: f32, scroll_y: f32) {
        let config = test_config();
        let layout = GridLayout::new(&config);
        let ranges = viewport(scroll_x, scroll_y, 300.0, 500.0).compute_ranges(&layout, &config);

        assert!(ranges.render_rows.start <= ranges.visible_rows.start);
        assert!(ranges.render_rows.end >= ranges.visible_rows.end);
        assert!(ranges.render_cols.start <= ranges.visible_cols.start);
        assert!(ranges.render_cols.end >= ranges.visible_cols.end);
        assert!(ranges.visible_rows.start <= ranges.visible_rows.end);
        assert!(ranges.visible_rows.end <= 100_000);
    }

    #[test]
    fn test_pure_function_stable_results() {
        let config = test_config();
        let layout = GridLayout::new(&config);
        let v = viewport(500.0, 12_345.0, 300.0, 500.0);
        assert_eq!(
            v.compute_ranges(&layout, &config),
            v.compute_ranges(&layout, &config)
        );
    }

    #[test]
    fn test_clamp_scroll() {
        let config = test_config();
        let layout = GridLayout::new(&config);
        let mut v = viewport(0.0, 0.0, 300.0, 500.0);

        v.set_scroll(-50.0, -50.0, &layout);
        assert_eq!((v.scroll_x, v.scroll_y), (0.0, 0.0));

        v.set_scroll(1e9, 1e9, &layout);
        // total width 1000 - viewport 300; total height 5,000,000 - 500
        assert_eq!(v.scroll_x, 700.0);
        assert_eq!(v.scroll_y, 4_999_500.0);
    }

    #[test]
    fn test_scroll_by_accumulates() {
        let config = test_config();
        let layout = GridLayout::new(&config);
        let mut v = viewport(0.0, 0.0, 300.0, 500.0);
        v.scroll_by(100.0, 200.0, &layout);
        v.scroll_by(100.0, 200.0, &layout);
        assert_eq!((v.scroll_x, v.scroll_y), (200.0, 400.0));
    }
}
