//! Slave subsystem — wire record, per-cycle polling, and aggregation.
//!
//! The [`PollScheduler`](poller::PollScheduler) visits every configured
//! address once per cycle and produces one [`SlaveResult`] per address,
//! in configuration order.  The [`aggregate`](aggregate::aggregate)
//! function reduces those results into a [`CycleSnapshot`](aggregate::CycleSnapshot)
//! that every status sink receives.

pub mod aggregate;
pub mod poller;
pub mod record;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use record::Tally;

/// Maximum number of slaves on the bus (fixed-capacity result sets).
pub const MAX_SLAVES: usize = 16;

/// 7-bit I2C address of one tally slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlaveAddress(pub u8);

impl SlaveAddress {
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SlaveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Per-address result after the retry policy has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaveOutcome {
    Ok(Tally),
    /// A single permitted attempt timed out.
    TimedOut,
    /// A single permitted attempt failed for another reason.
    TransportError(TransportError),
    /// Every permitted attempt failed; carries the last error seen.
    RetriesExhausted(TransportError),
}

impl SlaveOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn tally(&self) -> Option<Tally> {
        match self {
            Self::Ok(t) => Some(*t),
            _ => None,
        }
    }

    /// Build the failure outcome for an address whose attempts all failed.
    ///
    /// With a single permitted attempt the error is reported as-is;
    /// otherwise it is wrapped in `RetriesExhausted`.  With no retry there
    /// is nothing to call exhausted, and this keeps `TimedOut` and
    /// `TransportError` reachable.
    pub fn from_failure(last: TransportError, max_attempts: u8) -> Self {
        match (max_attempts, last) {
            (0 | 1, TransportError::Timeout) => Self::TimedOut,
            (0 | 1, e) => Self::TransportError(e),
            (_, e) => Self::RetriesExhausted(e),
        }
    }
}

impl fmt::Display for SlaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(_) => write!(f, "ok"),
            Self::TimedOut => write!(f, "timeout"),
            Self::TransportError(e) => write!(f, "{}", e.marker()),
            Self::RetriesExhausted(e) => write!(f, "retries_exhausted({})", e.marker()),
        }
    }
}

/// One address's contribution to a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaveResult {
    pub address: SlaveAddress,
    pub outcome: SlaveOutcome,
    /// Transactions issued for this address during the cycle.
    pub attempts: u8,
}

/// Ordered result set of one cycle, one entry per configured address.
pub type CycleResults = heapless::Vec<SlaveResult, MAX_SLAVES>;
