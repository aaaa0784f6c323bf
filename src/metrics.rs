//! Lightweight performance sampling: frame rate and store read timings.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Number of read timings kept for the rolling average.
const READ_TIMING_WINDOW: usize = 10;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frame-rate sampler for the render loop.
///
/// The presentation layer calls [`FrameSampler::record_frame`] once per
/// frame and [`FrameSampler::sample`] about once per second; `sample`
/// returns the frames-per-second over the elapsed window and resets it.
#[derive(Debug)]
pub struct FrameSampler {
    frames: u32,
    window_start: Instant,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSampler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: 0,
            window_start: Instant::now(),
        }
    }

    /// Count one rendered frame.
    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    /// Frames per second over the window since the last sample; resets
    /// the window. Returns 0 for an empty or zero-length window.
    pub fn sample(&mut self) -> f64 {
        let elapsed = self.window_start.elapsed().as_secs_f64();
        let fps = if elapsed > 0.0 {
            f64::from(self.frames) / elapsed
        } else {
            0.0
        };
        self.frames = 0;
        self.window_start = Instant::now();
        fps
    }
}

/// Rolling average of recent store read durations.
///
/// Cloneable handle; clones share the same window.
#[derive(Debug, Clone, Default)]
pub struct ReadTimings {
    window: Arc<Mutex<VecDeque<Duration>>>,
}

impl ReadTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one read duration, keeping only the most recent
    /// measurements.
    pub fn record(&self, elapsed: Duration) {
        let mut window = lock(&self.window);
        window.push_back(elapsed);
        while window.len() > READ_TIMING_WINDOW {
            window.pop_front();
        }
    }

    /// Average over the current window, or `None` before any read.
    #[must_use]
    pub fn average(&self) -> Option<Duration> {
        let window = lock(&self.window);
        if window.is_empty() {
            return None;
        }
        let total: Duration = window.iter().sum();
        Some(total / window.len() as u32)
    }
}
