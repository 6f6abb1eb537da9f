//! Hardware adapter — bridges the I²C master to the domain port traits.
//!
//! Owns the bus handle and exposes it through [`BusTransport`] (slave
//! reads) and [`ClockPort`] (DS3231 on the same bus).  Generic over any
//! `embedded_hal::i2c::I2c`, so the ESP-IDF `I2cDriver` and the host
//! [`SimulatedI2c`](super::sim_bus::SimulatedI2c) plug in unchanged.
//!
//! The bounded wait is enforced by the driver itself (its own timeout
//! register on ESP-IDF).  This adapter only classifies the failure: an
//! unspecific error that took at least the configured timeout is reported
//! as [`TransportError::Timeout`].

use std::time::{Duration, Instant};

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use log::{debug, info, warn};

use crate::app::ports::{BusTransport, ClockPort};
use crate::clock::{DS3231_ADDRESS, DS3231_REG_SECONDS, DS3231_TIME_REGS, DateTime, Timestamp};
use crate::error::TransportError;
use crate::slaves::SlaveAddress;
use crate::slaves::record::PACKET_SIZE;

/// Map a HAL error onto the transport taxonomy.
pub fn classify_error(kind: ErrorKind, elapsed: Duration, timeout: Duration) -> TransportError {
    match kind {
        ErrorKind::NoAcknowledge(_) => TransportError::NotAcknowledged,
        ErrorKind::ArbitrationLoss | ErrorKind::Bus | ErrorKind::Overrun => {
            TransportError::BusError
        }
        _ if elapsed >= timeout => TransportError::Timeout,
        _ => TransportError::BusError,
    }
}

/// Concrete adapter owning the one bus master.
pub struct HardwareAdapter<I> {
    bus: I,
    timeout: Duration,
    rtc_available: Option<bool>,
}

impl<I: I2c> HardwareAdapter<I> {
    pub fn new(bus: I, timeout_ms: u32) -> Self {
        Self {
            bus,
            timeout: Duration::from_millis(u64::from(timeout_ms)),
            rtc_available: None,
        }
    }

    pub fn bus(&self) -> &I {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut I {
        &mut self.bus
    }

    fn note_rtc(&mut self, available: bool) {
        if self.rtc_available != Some(available) {
            if available {
                info!("RTC: DS3231 answering at 0x{:02X}", DS3231_ADDRESS);
            } else {
                warn!("RTC: unavailable, using uptime timestamps");
            }
            self.rtc_available = Some(available);
        }
    }
}

// ── BusTransport implementation ───────────────────────────────

impl<I: I2c> BusTransport for HardwareAdapter<I> {
    fn request(&mut self, address: SlaveAddress) -> Result<[u8; PACKET_SIZE], TransportError> {
        let mut buf = [0u8; PACKET_SIZE];
        let started = Instant::now();
        match self.bus.read(address.raw(), &mut buf) {
            Ok(()) => Ok(buf),
            Err(e) => Err(classify_error(e.kind(), started.elapsed(), self.timeout)),
        }
    }
}

// ── ClockPort implementation ──────────────────────────────────

impl<I: I2c> ClockPort for HardwareAdapter<I> {
    fn now(&mut self) -> Option<Timestamp> {
        let mut regs = [0u8; DS3231_TIME_REGS];
        let read = self
            .bus
            .write_read(DS3231_ADDRESS, &[DS3231_REG_SECONDS], &mut regs);
        let decoded = match read {
            Ok(()) => DateTime::from_ds3231(&regs),
            Err(e) => {
                debug!("RTC read failed: {:?}", e.kind());
                None
            }
        };
        self.note_rtc(decoded.is_some());
        decoded.map(Timestamp::Wall)
    }
}
