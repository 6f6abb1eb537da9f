//! Indicator palette.
//!
//! Maps the cycle lifecycle onto the fixed set of LED colours operators
//! learn to read at a glance.  `Reading` is shown while the bus is being
//! polled, the status colour once the snapshot is ready.

use core::fmt;

use crate::drivers::status_led::Rgb;
use crate::slaves::aggregate::OverallStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorState {
    Off,
    /// Waiting: before the first cycle, or nothing configured to poll.
    Idle,
    /// A poll cycle is in progress.
    Reading,
    /// Every slave answered.
    Success,
    /// Some slaves failed.
    Warning,
    /// Every slave failed.
    Error,
}

impl IndicatorState {
    pub const fn rgb(self) -> Rgb {
        match self {
            Self::Off => (0, 0, 0),
            Self::Idle => (0, 0, 50),
            Self::Reading => (255, 255, 0),
            Self::Success => (0, 255, 0),
            Self::Warning => (255, 128, 0),
            Self::Error => (255, 0, 0),
        }
    }

    pub const fn for_status(status: OverallStatus) -> Self {
        match status {
            OverallStatus::AllOk => Self::Success,
            OverallStatus::PartialFailure => Self::Warning,
            OverallStatus::AllFailed => Self::Error,
            OverallStatus::Idle | OverallStatus::NoSlaves => Self::Idle,
        }
    }
}

impl fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "off",
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
