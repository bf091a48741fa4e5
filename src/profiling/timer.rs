//! Wall-clock timing for whole kernel calls.
//!
//! Kernel calls here are parallel and run for micro- to milliseconds, so a
//! monotonic wall clock is the right measure; per-core cycle counters would
//! miss the other threads.

use std::time::{Duration, Instant};

/// Monotonic stopwatch started on construction.
#[derive(Debug, Clone, Copy)]
pub struct WallTimer {
    start: Instant,
}

impl WallTimer {
    #[inline(always)]
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline(always)]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// Time one closure call, returning its result and the elapsed seconds.
#[inline]
pub fn time_once<R>(f: impl FnOnce() -> R) -> (R, f64) {
    let t = WallTimer::start();
    let r = f();
    (r, t.elapsed_secs())
}
