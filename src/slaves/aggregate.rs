//! Aggregator — reduces one cycle's per-slave results into a snapshot.
//!
//! [`aggregate`] is a pure function: the same results and timestamp always
//! produce an identical [`CycleSnapshot`].  Failed slaves contribute zero
//! to the totals; nothing here can fail.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::record::Tally;
use super::{CycleResults, SlaveResult};
use crate::clock::Timestamp;

// ───────────────────────────────────────────────────────────────
// Overall status
// ───────────────────────────────────────────────────────────────

/// Cycle-level health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallStatus {
    /// No cycle has completed yet.  Never produced by [`classify`].
    Idle,
    AllOk,
    PartialFailure,
    AllFailed,
    /// The address list is empty; there is nothing to be healthy or not.
    NoSlaves,
}

impl OverallStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AllOk => "all_ok",
            Self::PartialFailure => "partial_failure",
            Self::AllFailed => "all_failed",
            Self::NoSlaves => "no_slaves",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a cycle's results.
pub fn classify(results: &[SlaveResult]) -> OverallStatus {
    if results.is_empty() {
        return OverallStatus::NoSlaves;
    }
    let ok = results.iter().filter(|r| r.outcome.is_ok()).count();
    if ok == results.len() {
        OverallStatus::AllOk
    } else if ok == 0 {
        OverallStatus::AllFailed
    } else {
        OverallStatus::PartialFailure
    }
}

// ───────────────────────────────────────────────────────────────
// Totals
// ───────────────────────────────────────────────────────────────

/// Element-wise sum of the successful tallies.
///
/// Counters are widened to `u32`: sixteen slaves at `u16::MAX` each
/// cannot overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Totals {
    pub favor: u32,
    pub contra: u32,
    pub neutral: u32,
}

/// Dominant opinion class over a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Favor,
    Contra,
    Neutral,
    /// Two or more classes share the maximum.
    Tie,
    /// Every counter is zero.
    NoData,
}

impl Verdict {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Favor => "favor",
            Self::Contra => "contra",
            Self::Neutral => "neutral",
            Self::Tie => "tie",
            Self::NoData => "no_data",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Totals {
    pub fn add(&mut self, t: &Tally) {
        self.favor += u32::from(t.favor);
        self.contra += u32::from(t.contra);
        self.neutral += u32::from(t.neutral);
    }

    pub fn total(&self) -> u32 {
        self.favor + self.contra + self.neutral
    }

    pub fn verdict(&self) -> Verdict {
        let max = self.favor.max(self.contra).max(self.neutral);
        if max == 0 {
            return Verdict::NoData;
        }
        let winners = [self.favor, self.contra, self.neutral]
            .iter()
            .filter(|&&v| v == max)
            .count();
        if winners > 1 {
            Verdict::Tie
        } else if self.favor == max {
            Verdict::Favor
        } else if self.contra == max {
            Verdict::Contra
        } else {
            Verdict::Neutral
        }
    }

    /// Integer percentage share of each class, rounded down.
    /// `(0, 0, 0)` when there is no data.
    pub fn percentages(&self) -> (u8, u8, u8) {
        let total = u64::from(self.total());
        if total == 0 {
            return (0, 0, 0);
        }
        let pct = |v: u32| (u64::from(v) * 100 / total) as u8;
        (pct(self.favor), pct(self.contra), pct(self.neutral))
    }
}

// ───────────────────────────────────────────────────────────────
// Snapshot
// ───────────────────────────────────────────────────────────────

/// Immutable result of one cycle, handed read-only to every sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSnapshot {
    /// 1-based cycle number.
    pub cycle: u64,
    pub timestamp: Timestamp,
    /// One entry per configured address, in configuration order.
    pub results: CycleResults,
    pub totals: Totals,
    pub status: OverallStatus,
}

impl CycleSnapshot {
    pub fn ok_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.ok_count()
    }
}

/// Reduce a cycle's results into a snapshot.
///
/// At most [`MAX_SLAVES`](super::MAX_SLAVES) results are kept.  Totals and
/// status are computed from the kept results only, so the snapshot is
/// always self-consistent.
pub fn aggregate(cycle: u64, timestamp: Timestamp, results: &[SlaveResult]) -> CycleSnapshot {
    let kept = &results[..results.len().min(super::MAX_SLAVES)];
    let mut totals = Totals::default();
    for tally in kept.iter().filter_map(|r| r.outcome.tally()) {
        totals.add(&tally);
    }

    let mut owned = CycleResults::new();
    for r in kept {
        let _ = owned.push(*r);
    }

    CycleSnapshot {
        cycle,
        timestamp,
        results: owned,
        totals,
        status: classify(kept),
    }
}
