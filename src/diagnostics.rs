//! Link statistics and runtime diagnostics.
//!
//! [`Diagnostics`] follows every snapshot and keeps per-slave counters
//! (successes, failures, attempts, failure streak) plus cycle-level
//! counters (per-status totals, overruns, worst cycle time).  It reports
//! link transitions so the cycle driver can emit `SlaveLost` /
//! `SlaveRecovered` exactly once per change instead of once per cycle.

use serde::{Deserialize, Serialize};

use crate::slaves::aggregate::{CycleSnapshot, OverallStatus};
use crate::slaves::{MAX_SLAVES, SlaveAddress, SlaveOutcome};

// ───────────────────────────────────────────────────────────────
// Per-slave link statistics
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaveLinkStats {
    pub address: SlaveAddress,
    pub successes: u32,
    pub failures: u32,
    /// Transactions issued, retries included.
    pub attempts: u64,
    /// Failed cycles in a row; zero while the link is up.
    pub consecutive_failures: u32,
}

impl SlaveLinkStats {
    fn new(address: SlaveAddress) -> Self {
        Self {
            address,
            successes: 0,
            failures: 0,
            attempts: 0,
            consecutive_failures: 0,
        }
    }

    /// Share of successful cycles, 0–100.
    pub fn success_percent(&self) -> u8 {
        let total = u64::from(self.successes) + u64::from(self.failures);
        if total == 0 {
            return 0;
        }
        (u64::from(self.successes) * 100 / total) as u8
    }
}

/// A change in a slave's link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    /// First failed cycle after a good one (or on the very first cycle).
    Lost {
        address: SlaveAddress,
        outcome: SlaveOutcome,
    },
    /// First good cycle after one or more failed ones.
    Recovered {
        address: SlaveAddress,
        after_failures: u32,
    },
}

// ───────────────────────────────────────────────────────────────
// Cycle-level summary
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub cycles: u64,
    pub all_ok: u64,
    pub partial_failure: u64,
    pub all_failed: u64,
    pub no_slaves: u64,
    pub overruns: u64,
    pub worst_cycle_ms: u64,
    pub total_attempts: u64,
    pub total_failures: u64,
    /// Slave with the most failed cycles, if any failed at all.
    pub worst_slave: Option<SlaveAddress>,
    pub heap_free: Option<u32>,
}

pub struct Diagnostics {
    slaves: heapless::Vec<SlaveLinkStats, MAX_SLAVES>,
    summary: StatsSummary,
}

impl Diagnostics {
    pub fn new(addresses: &[SlaveAddress]) -> Self {
        let slaves = addresses
            .iter()
            .take(MAX_SLAVES)
            .map(|&a| SlaveLinkStats::new(a))
            .collect();
        Self {
            slaves,
            summary: StatsSummary::default(),
        }
    }

    /// Fold one snapshot into the counters; returns the link changes.
    pub fn record_cycle(&mut self, snapshot: &CycleSnapshot) -> heapless::Vec<LinkChange, MAX_SLAVES> {
        let mut changes = heapless::Vec::new();

        self.summary.cycles += 1;
        match snapshot.status {
            OverallStatus::AllOk => self.summary.all_ok += 1,
            OverallStatus::PartialFailure => self.summary.partial_failure += 1,
            OverallStatus::AllFailed => self.summary.all_failed += 1,
            OverallStatus::NoSlaves => self.summary.no_slaves += 1,
            OverallStatus::Idle => {}
        }

        for result in &snapshot.results {
            let Some(stats) = self.slaves.iter_mut().find(|s| s.address == result.address) else {
                continue;
            };
            stats.attempts += u64::from(result.attempts);
            self.summary.total_attempts += u64::from(result.attempts);

            let change = if result.outcome.is_ok() {
                stats.successes += 1;
                let streak = core::mem::take(&mut stats.consecutive_failures);
                (streak > 0).then_some(LinkChange::Recovered {
                    address: result.address,
                    after_failures: streak,
                })
            } else {
                stats.failures += 1;
                self.summary.total_failures += 1;
                stats.consecutive_failures += 1;
                (stats.consecutive_failures == 1).then_some(LinkChange::Lost {
                    address: result.address,
                    outcome: result.outcome,
                })
            };

            if let Some(c) = change {
                let _ = changes.push(c);
            }
        }

        changes
    }

    /// Record the timing of a finished cycle.
    pub fn record_timing(&mut self, elapsed_ms: u64, overran: bool) {
        if overran {
            self.summary.overruns += 1;
        }
        self.summary.worst_cycle_ms = self.summary.worst_cycle_ms.max(elapsed_ms);
    }

    pub fn slave(&self, address: SlaveAddress) -> Option<&SlaveLinkStats> {
        self.slaves.iter().find(|s| s.address == address)
    }

    pub fn slaves(&self) -> &[SlaveLinkStats] {
        &self.slaves
    }

    /// Current counters plus live heap figures.
    pub fn summary(&self) -> StatsSummary {
        let worst_slave = self
            .slaves
            .iter()
            .filter(|s| s.failures > 0)
            .max_by_key(|s| s.failures)
            .map(|s| s.address);
        StatsSummary {
            worst_slave,
            heap_free: heap_free(),
            ..self.summary
        }
    }
}

#[cfg(target_os = "espidf")]
fn heap_free() -> Option<u32> {
    // SAFETY: read-only query of the allocator counters.
    Some(unsafe { esp_idf_svc::sys::esp_get_free_heap_size() })
}

#[cfg(not(target_os = "espidf"))]
fn heap_free() -> Option<u32> {
    None
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that routes the panic message through `log`
/// before the default handler runs (and, on the device, resets).
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        match info.location() {
            Some(loc) => log::error!("PANIC: {} at {}:{}", reason, loc.file(), loc.line()),
            None => log::error!("PANIC: {}", reason),
        }
        default_hook(info);
    }));
}
