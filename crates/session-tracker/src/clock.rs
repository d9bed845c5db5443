//! Time sources for sample timestamps

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Monotonic clock for sample timestamps plus wall time for status records
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Real monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that advances by a fixed step on every reading.
///
/// Gives evenly spaced sample times regardless of scheduling jitter, e.g.
/// when replaying recorded frames.
#[derive(Debug)]
pub struct SteppingClock {
    origin: Instant,
    step: Duration,
    ticks: AtomicU32,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            origin: Instant::now(),
            step,
            ticks: AtomicU32::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        self.origin + self.step * tick
    }
}
