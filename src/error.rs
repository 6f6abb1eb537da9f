//! Unified error types for the tallymaster firmware.
//!
//! One small `Copy` enum per layer, each convertible into the top-level
//! [`Error`].  Transaction-level errors are recovered by retry inside the
//! poll scheduler, sink errors are reported and swallowed by the cycle
//! driver, and only configuration errors ever stop the firmware (at boot).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A single bus transaction failed.
    Transport(TransportError),
    /// Startup configuration is invalid.
    Config(ConfigError),
    /// A status sink (indicator, display, logger) failed.
    Sink(SinkError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Sink(e) => write!(f, "sink: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Outcome of one failed read transaction against one slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportError {
    /// The slave did not acknowledge its address (absent or busy).
    NotAcknowledged,
    /// The transaction did not complete within the configured timeout.
    Timeout,
    /// Arbitration loss, bus fault, or a payload of the wrong length.
    BusError,
}

impl TransportError {
    /// Short lowercase marker used in CSV rows and log lines.
    pub const fn marker(self) -> &'static str {
        match self {
            Self::NotAcknowledged => "nack",
            Self::Timeout => "timeout",
            Self::BusError => "bus_error",
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAcknowledged => write!(f, "address not acknowledged"),
            Self::Timeout => write!(f, "transaction timed out"),
            Self::BusError => write!(f, "bus error"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The same slave address appears twice.
    DuplicateAddress(u8),
    /// The address belongs to a fixed-function peripheral (display, RTC).
    ReservedAddress(u8),
    /// Outside the usable 7-bit range `0x08..=0x77`.
    AddressOutOfRange(u8),
    /// More slaves than the fixed-capacity result set can hold.
    TooManySlaves(usize),
    ZeroRetries,
    ZeroTimeout,
    ZeroInterval,
    /// The configuration document could not be parsed.
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateAddress(a) => write!(f, "duplicate slave address 0x{a:02X}"),
            Self::ReservedAddress(a) => write!(f, "slave address 0x{a:02X} is reserved"),
            Self::AddressOutOfRange(a) => {
                write!(f, "slave address 0x{a:02X} outside 0x08..=0x77")
            }
            Self::TooManySlaves(n) => write!(f, "{n} slaves configured, capacity exceeded"),
            Self::ZeroRetries => write!(f, "max_retries must be at least 1"),
            Self::ZeroTimeout => write!(f, "i2c_timeout_ms must be non-zero"),
            Self::ZeroInterval => write!(f, "cycle_interval_ms must be non-zero"),
            Self::Parse => write!(f, "configuration could not be parsed"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

/// Failure of a best-effort status sink.  Never propagated past the
/// cycle driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The output device is not present or did not respond.
    DeviceAbsent,
    /// The write was attempted and failed (storage unavailable, full, ...).
    WriteFailed,
    /// The background writer's queue is full; the record was dropped.
    QueueFull,
    /// The sink is disabled in configuration.
    Disabled,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceAbsent => write!(f, "device absent"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::QueueFull => write!(f, "queue full, record dropped"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}
