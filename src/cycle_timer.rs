//! Fixed-period cycle gating.
//!
//! Each cycle is anchored at its own start time: the next cycle begins
//! `interval` after the previous one began, or immediately when the cycle
//! overran.  Missed periods are never queued up and replayed.
//!
//! ```text
//!   start        start        start  start
//!   │── cycle ──┐ │── cycle ─────────┤── …
//!   │   wait    │ │      overrun     │
//!   ├───────────┴─┤                  │
//!   0        interval           (no wait)
//! ```
//!
//! Time is passed in as milliseconds since boot so the arithmetic is
//! testable without sleeping.

/// Timing of one finished cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    /// Time from cycle start to finish.
    pub elapsed_ms: u64,
    /// How long to wait before the next cycle starts.
    pub wait_ms: u64,
    /// The cycle took longer than the interval.
    pub overran: bool,
}

pub struct CycleTimer {
    interval_ms: u64,
    started_at: Option<u64>,
    cycles: u64,
    overruns: u64,
    worst_ms: u64,
}

impl CycleTimer {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms),
            started_at: None,
            cycles: 0,
            overruns: 0,
            worst_ms: 0,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Mark the start of a cycle.
    pub fn begin(&mut self, now_ms: u64) {
        self.started_at = Some(now_ms);
    }

    /// Mark the end of the current cycle and compute the wait.
    ///
    /// Without a matching [`begin`](Self::begin) the cycle is treated as
    /// having taken no time.
    pub fn finish(&mut self, now_ms: u64) -> CycleTiming {
        let start = self.started_at.take().unwrap_or(now_ms);
        let elapsed_ms = now_ms.saturating_sub(start);
        let overran = elapsed_ms > self.interval_ms;

        self.cycles += 1;
        if overran {
            self.overruns += 1;
        }
        self.worst_ms = self.worst_ms.max(elapsed_ms);

        CycleTiming {
            elapsed_ms,
            wait_ms: self.interval_ms.saturating_sub(elapsed_ms),
            overran,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Longest cycle seen so far.
    pub fn worst_cycle_ms(&self) -> u64 {
        self.worst_ms
    }
}
