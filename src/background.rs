//! Progressive background population of the whole grid.
//!
//! Loads chunks sequentially from the first unloaded index, pausing
//! briefly between chunks so interactive viewport loads interleave with
//! the background pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::generator::total_chunks;
use crate::store::ChunkStore;

/// Pause between chunk loads, leaving room for interactive work.
const CHUNK_PAUSE: Duration = Duration::from_millis(100);

/// Handle to a running background loading pass.
///
/// Stopping is cooperative: the flag is consulted between chunks, and an
/// already-started chunk load always runs to completion so no chunk is
/// left half-written. A fresh pass may be started later and resumes from
/// the first unloaded chunk.
pub struct BackgroundLoader {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl BackgroundLoader {
    /// Spawn a background pass over every chunk of the store.
    #[must_use]
    pub fn start(store: ChunkStore) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let task = tokio::spawn(async move {
            let total = total_chunks(store.total_rows());
            info!(total_chunks = total, "background loading started");
            for chunk_index in 0..total {
                if flag.load(Ordering::Relaxed) {
                    info!(chunk_index, "background loading stopped");
                    return;
                }
                if store.is_chunk_loaded(chunk_index) {
                    continue;
                }
                if let Err(e) = store.load_chunk(chunk_index).await {
                    warn!(error = %e, "background chunk load failed");
                    return;
                }
                tokio::time::sleep(CHUNK_PAUSE).await;
            }
            info!("background loading complete");
        });
        Self { stop, task }
    }

    /// Ask the pass to stop after the current chunk.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// True once the task has exited (finished, stopped, or failed).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to exit.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}
