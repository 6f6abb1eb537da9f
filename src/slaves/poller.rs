//! Poll scheduler — one bounded-retry read per configured slave per cycle.
//!
//! The scheduler borrows the bus exclusively for the whole cycle, so only
//! one transaction is ever outstanding.  Each address gets a fresh retry
//! budget; exhausting it degrades that address only and the scheduler
//! always moves on to the next one.

use log::{debug, warn};

use super::record::decode;
use super::{CycleResults, SlaveAddress, SlaveOutcome, SlaveResult};
use crate::app::ports::BusTransport;
use crate::error::TransportError;

pub struct PollScheduler {
    addresses: heapless::Vec<SlaveAddress, { super::MAX_SLAVES }>,
    max_attempts: u8,
}

impl PollScheduler {
    /// `max_attempts` is the total number of transactions allowed per
    /// address per cycle (the configured `MAX_RETRIES`).  Zero is treated
    /// as one; the configuration layer rejects it before this point.
    pub fn new(addresses: &[SlaveAddress], max_attempts: u8) -> Self {
        let mut list = heapless::Vec::new();
        for &a in addresses.iter().take(super::MAX_SLAVES) {
            // Capacity checked by the take() above.
            let _ = list.push(a);
        }
        Self {
            addresses: list,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn addresses(&self) -> &[SlaveAddress] {
        &self.addresses
    }

    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    /// Poll every configured address once, in configuration order.
    pub fn poll_cycle(&self, bus: &mut impl BusTransport) -> CycleResults {
        let mut results = CycleResults::new();
        for &address in &self.addresses {
            let result = self.poll_address(bus, address);
            // Same capacity as `self.addresses`.
            let _ = results.push(result);
        }
        results
    }

    /// Read one address, retrying immediately on any transaction error.
    pub fn poll_address(&self, bus: &mut impl BusTransport, address: SlaveAddress) -> SlaveResult {
        let mut last_error = TransportError::BusError;
        let mut attempts: u8 = 0;

        while attempts < self.max_attempts {
            attempts += 1;
            match bus.request(address).and_then(|payload| decode(&payload)) {
                Ok(tally) => {
                    return SlaveResult {
                        address,
                        outcome: SlaveOutcome::Ok(tally),
                        attempts,
                    };
                }
                Err(e) => {
                    debug!(
                        "poll {}: attempt {}/{} failed: {}",
                        address, attempts, self.max_attempts, e
                    );
                    last_error = e;
                }
            }
        }

        let outcome = SlaveOutcome::from_failure(last_error, self.max_attempts);
        warn!("poll {}: {} after {} attempt(s)", address, outcome, attempts);
        SlaveResult {
            address,
            outcome,
            attempts,
        }
    }
}
