//! Outbound application events.
//!
//! The [`MasterService`](super::service::MasterService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the firmware logs them to serial.

use crate::clock::Timestamp;
use crate::diagnostics::StatsSummary;
use crate::error::SinkError;
use crate::slaves::aggregate::{OverallStatus, Totals, Verdict};
use crate::slaves::{SlaveAddress, SlaveOutcome};

/// Which status sink an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Indicator,
    Display,
    Recorder,
}

impl SinkKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Indicator => "indicator",
            Self::Display => "display",
            Self::Recorder => "recorder",
        }
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started with this many configured slaves.
    Started { slaves: usize, interval_ms: u32 },

    /// One cycle finished and its snapshot went to the sinks.
    CycleCompleted(CycleSummary),

    /// The overall status differs from the previous cycle's.
    StatusChanged {
        from: OverallStatus,
        to: OverallStatus,
    },

    /// A slave that was answering stopped answering.
    SlaveLost {
        address: SlaveAddress,
        outcome: SlaveOutcome,
    },

    /// A slave answered again after failing.
    SlaveRecovered {
        address: SlaveAddress,
        after_failures: u32,
    },

    /// A cycle took longer than the interval; the next starts at once.
    CycleOverrun { elapsed_ms: u64, interval_ms: u64 },

    /// A best-effort sink failed; polling continues.
    SinkFailed { sink: SinkKind, error: SinkError },

    /// Periodic counters.
    Stats(StatsSummary),
}

/// Compact per-cycle record for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle: u64,
    pub timestamp: Timestamp,
    pub status: OverallStatus,
    pub ok: usize,
    pub configured: usize,
    pub totals: Totals,
    pub verdict: Verdict,
}
