//! Master configuration.
//!
//! One immutable [`MasterConfig`] is built at startup, validated once, and
//! passed explicitly to the service and drivers.  Nothing here changes at
//! runtime.  On the host the defaults can be overridden from a JSON file.

use serde::{Deserialize, Serialize};

use crate::clock::DS3231_ADDRESS;
use crate::error::ConfigError;
use crate::pins;
use crate::slaves::{MAX_SLAVES, SlaveAddress};

/// Addresses that belong to fixed-function peripherals on the same bus.
pub const RESERVED_ADDRESSES: [u8; 3] = [0x3C, 0x3D, DS3231_ADDRESS];

/// Usable 7-bit address range (excludes the I²C reserved blocks).
pub const ADDRESS_RANGE: core::ops::RangeInclusive<u8> = 0x08..=0x77;

/// Depth of the background recorder's queue (snapshots).
pub const RECORD_QUEUE_DEPTH: usize = 8;

/// Maximum length of the log file path.
pub const LOG_PATH_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BusSpeed {
    /// 100 kHz.
    #[default]
    Standard,
    /// 400 kHz.
    Fast,
}

impl BusSpeed {
    pub const fn hz(self) -> u32 {
        match self {
            Self::Standard => pins::I2C_STANDARD_HZ,
            Self::Fast => pins::I2C_FAST_HZ,
        }
    }
}

/// Core master configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    // --- Bus ---
    /// Slave addresses, polled in this order every cycle.
    pub slave_addresses: heapless::Vec<u8, MAX_SLAVES>,
    pub bus_speed: BusSpeed,
    /// Per-transaction timeout (milliseconds)
    pub i2c_timeout_ms: u32,
    /// Attempts per slave per cycle, including the first
    pub max_retries: u8,

    // --- Timing ---
    /// Period between cycle starts (milliseconds)
    pub cycle_interval_ms: u32,
    /// Sample window of each slave; informational, the master trusts the wire
    pub samples_per_slave: u16,

    // --- Optional sinks ---
    pub enable_display: bool,
    pub enable_rtc: bool,
    pub enable_rgb_led: bool,
    pub enable_logging: bool,
    /// CSV log file
    pub log_path: heapless::String<LOG_PATH_CAPACITY>,

    // --- Diagnostics ---
    /// Emit a STATS event every this many cycles (0 = never)
    pub stats_every_cycles: u32,
}

impl Default for MasterConfig {
    fn default() -> Self {
        let mut slave_addresses = heapless::Vec::new();
        for a in [0x10, 0x11, 0x12, 0x13] {
            let _ = slave_addresses.push(a);
        }

        let mut log_path = heapless::String::new();
        #[cfg(target_os = "espidf")]
        let _ = log_path.push_str(crate::drivers::hw_init::SD_MOUNT_POINT);
        let _ = log_path.push_str(DEFAULT_LOG_FILE);

        Self {
            // Bus
            slave_addresses,
            bus_speed: BusSpeed::Standard,
            i2c_timeout_ms: 100,
            max_retries: 3,

            // Timing
            cycle_interval_ms: 1500,
            samples_per_slave: 256,

            // Sinks
            enable_display: true,
            enable_rtc: true,
            enable_rgb_led: true,
            enable_logging: true,
            log_path,

            stats_every_cycles: 20,
        }
    }
}

/// File name of the cycle log; on the device it sits at the card root.
#[cfg(target_os = "espidf")]
const DEFAULT_LOG_FILE: &str = "/datalog.csv";
#[cfg(not(target_os = "espidf"))]
const DEFAULT_LOG_FILE: &str = "datalog.csv";

impl MasterConfig {
    /// Reject configurations that cannot be run.
    ///
    /// An empty address list is valid; the master then runs degenerate
    /// cycles that report `NoSlaves`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if self.i2c_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.cycle_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        for (i, &addr) in self.slave_addresses.iter().enumerate() {
            if !ADDRESS_RANGE.contains(&addr) {
                return Err(ConfigError::AddressOutOfRange(addr));
            }
            if RESERVED_ADDRESSES.contains(&addr) {
                return Err(ConfigError::ReservedAddress(addr));
            }
            if self.slave_addresses[..i].contains(&addr) {
                return Err(ConfigError::DuplicateAddress(addr));
            }
        }
        Ok(())
    }

    /// Addresses as typed values, in polling order.
    pub fn addresses(&self) -> heapless::Vec<SlaveAddress, MAX_SLAVES> {
        self.slave_addresses.iter().map(|&a| SlaveAddress(a)).collect()
    }

    /// Upper bound on one poll cycle: every slave times out on every attempt.
    pub fn worst_case_cycle_ms(&self) -> u32 {
        (self.slave_addresses.len() as u32)
            .saturating_mul(u32::from(self.max_retries))
            .saturating_mul(self.i2c_timeout_ms)
    }

    /// Whether a worst-case cycle can exceed the configured interval.
    pub fn may_overrun(&self) -> bool {
        self.worst_case_cycle_ms() > self.cycle_interval_ms
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        raw.into_config()
    }
}

/// Wire form of the JSON document.  The address list is read unbounded so
/// that an oversize list reports `TooManySlaves` instead of a parse error.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    slave_addresses: Option<Vec<u8>>,
    #[serde(flatten)]
    rest: MasterConfig,
}

impl RawConfig {
    fn into_config(self) -> Result<MasterConfig, ConfigError> {
        let mut config = self.rest;
        if let Some(list) = self.slave_addresses {
            if list.len() > MAX_SLAVES {
                return Err(ConfigError::TooManySlaves(list.len()));
            }
            config.slave_addresses = list.into_iter().collect();
        }
        Ok(config)
    }
}
