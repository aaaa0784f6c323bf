//! vgrid - virtualized grid data core
//!
//! The data layer behind a 100,000-row × 100-column scrollable grid demo:
//! - Windowed virtualization: visible/render range math with overscan
//! - Chunked lazy loading: 1,000-row chunks persisted to embedded SQLite
//! - Bounded LRU cell cache to avoid redundant store reads
//! - Viewport-driven orchestration with deduplicated in-flight loads
//!
//! Presentation (components, styling, navigation) is out of scope; a UI
//! drives this crate through [`GridData`] and [`Viewport`].
//!
//! # Usage
//!
//! ```no_run
//! use vgrid::{GridConfig, GridData, Viewport};
//!
//! # async fn demo() -> vgrid::Result<()> {
//! let grid = GridData::open(GridConfig::default(), "grid_data.db")?;
//! let mut viewport = Viewport::new();
//! viewport.resize(400.0, 800.0);
//!
//! let ranges = grid.compute_ranges(&viewport);
//! grid.ensure_ranges(&ranges).await;
//!
//! let cell = grid.get_cell_data(0, 0);
//! # let _ = cell;
//! # Ok(())
//! # }
//! ```

pub mod background;
pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod layout;
pub mod metrics;
pub mod store;
pub mod types;
pub mod viewport;

pub use background::BackgroundLoader;
pub use cache::CellCache;
pub use config::{ColumnSpec, GridConfig};
pub use error::{ChunkLoadError, GridError, RangeFetchError, Result};
pub use generator::CHUNK_SIZE;
pub use grid::GridData;
pub use layout::GridLayout;
pub use metrics::{FrameSampler, ReadTimings};
pub use store::ChunkStore;
pub use types::{Cell, LoadingProgress};
pub use viewport::{Viewport, VisibleRanges};

/// Get the library version.
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
