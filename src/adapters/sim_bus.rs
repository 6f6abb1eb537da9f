//! Simulated I²C bus for host runs and tests.
//!
//! [`SimulatedI2c`] implements `embedded_hal::i2c::I2c` and hosts a set of
//! scripted tally slaves plus an optional DS3231.  Plugged into
//! [`HardwareAdapter`](super::hardware::HardwareAdapter) it exercises the
//! exact code path the firmware runs, minus the silicon.
//!
//! Unknown addresses NACK, like an empty bus.

use std::collections::BTreeMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::{DS3231_ADDRESS, DateTime};
use crate::slaves::record::{PACKET_SIZE, Tally};

/// Error type surfaced by the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimI2cError(pub ErrorKind);

impl embedded_hal::i2c::Error for SimI2cError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// How one simulated slave answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaveBehaviour {
    /// Same tally on every read.
    Fixed(Tally),
    /// Fresh pseudo-random tally over `samples`, NACKing roughly
    /// `nack_per_mille` reads out of a thousand.
    Random { samples: u16, nack_per_mille: u16 },
    /// NACKs the first `failures` reads, then answers `tally`.
    FlakyThen { failures: u32, tally: Tally },
    /// Never acknowledges.
    Absent,
    /// Holds the bus for the stall period, then fails without a NACK.
    Stall,
    /// Loses arbitration on every read.
    Garbled,
}

struct SimSlave {
    behaviour: SlaveBehaviour,
    requests: u32,
}

struct SimRtc {
    base_unix: u64,
    since: Instant,
}

pub struct SimulatedI2c {
    slaves: BTreeMap<u8, SimSlave>,
    rtc: Option<SimRtc>,
    rng: StdRng,
    stall: Duration,
    transactions: u64,
}

impl SimulatedI2c {
    pub fn new(seed: u64) -> Self {
        Self {
            slaves: BTreeMap::new(),
            rtc: None,
            rng: StdRng::seed_from_u64(seed),
            stall: Duration::from_millis(100),
            transactions: 0,
        }
    }

    /// Add or replace a slave.
    pub fn with_slave(mut self, address: u8, behaviour: SlaveBehaviour) -> Self {
        self.set_behaviour(address, behaviour);
        self
    }

    /// Attach a DS3231 that starts at `base` and advances in real time.
    pub fn with_rtc(mut self, base: DateTime) -> Self {
        self.rtc = Some(SimRtc {
            base_unix: base.to_unix(),
            since: Instant::now(),
        });
        self
    }

    /// Attach a DS3231 set to the host's wall clock.
    pub fn with_host_rtc(mut self) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        self.rtc = Some(SimRtc {
            base_unix: now,
            since: Instant::now(),
        });
        self
    }

    /// How long a [`SlaveBehaviour::Stall`] read holds the bus.
    pub fn with_stall(mut self, stall: Duration) -> Self {
        self.stall = stall;
        self
    }

    pub fn set_behaviour(&mut self, address: u8, behaviour: SlaveBehaviour) {
        self.slaves.insert(
            address,
            SimSlave {
                behaviour,
                requests: 0,
            },
        );
    }

    /// Reads addressed to `address` so far (0 for unknown addresses).
    pub fn requests_to(&self, address: u8) -> u32 {
        self.slaves.get(&address).map_or(0, |s| s.requests)
    }

    /// All transactions, RTC included.
    pub fn transactions(&self) -> u64 {
        self.transactions
    }

    fn slave_reply(&mut self, address: u8) -> Result<[u8; PACKET_SIZE], SimI2cError> {
        let nack = SimI2cError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        let Some(slave) = self.slaves.get_mut(&address) else {
            return Err(nack);
        };
        slave.requests += 1;

        match slave.behaviour {
            SlaveBehaviour::Fixed(tally) => Ok(tally.to_bytes()),
            SlaveBehaviour::Random {
                samples,
                nack_per_mille,
            } => {
                if self.rng.gen_range(0..1000) < nack_per_mille {
                    return Err(nack);
                }
                let favor = self.rng.gen_range(0..=samples);
                let contra = self.rng.gen_range(0..=samples - favor);
                let neutral = samples - favor - contra;
                Ok(Tally::new(favor, contra, neutral).to_bytes())
            }
            SlaveBehaviour::FlakyThen { failures, tally } => {
                if slave.requests <= failures {
                    Err(nack)
                } else {
                    Ok(tally.to_bytes())
                }
            }
            SlaveBehaviour::Absent => Err(nack),
            SlaveBehaviour::Stall => {
                std::thread::sleep(self.stall);
                Err(SimI2cError(ErrorKind::Other))
            }
            SlaveBehaviour::Garbled => Err(SimI2cError(ErrorKind::ArbitrationLoss)),
        }
    }

    fn rtc_transaction(&mut self, operations: &mut [Operation<'_>]) -> Result<(), SimI2cError> {
        let Some(rtc) = &self.rtc else {
            return Err(SimI2cError(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        };
        let now = rtc.base_unix + rtc.since.elapsed().as_secs();
        let regs = DateTime::from_unix(now).to_ds3231();

        let mut pointer = 0usize;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some(&reg) = bytes.first() {
                        pointer = usize::from(reg);
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = regs.get(pointer).copied().unwrap_or(0);
                        pointer += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

impl ErrorType for SimulatedI2c {
    type Error = SimI2cError;
}

impl I2c for SimulatedI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), SimI2cError> {
        self.transactions += 1;
        if address == DS3231_ADDRESS {
            return self.rtc_transaction(operations);
        }

        let reply = self.slave_reply(address)?;
        for op in operations {
            if let Operation::Read(buf) = op {
                let n = buf.len().min(PACKET_SIZE);
                buf[..n].copy_from_slice(&reply[..n]);
            }
        }
        Ok(())
    }
}
