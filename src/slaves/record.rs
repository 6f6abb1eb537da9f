//! Slave record decoder.
//!
//! Every slave answers a read with exactly [`PACKET_SIZE`] bytes: three
//! little-endian `u16` counters in the order favor, contra, neutral.
//! That is the native layout of the `uint16_t[3]` array the slave
//! firmware hands to its I2C peripheral, so the master must match it.
//!
//! ```text
//!  byte   0    1    2    3    4    5
//!       ┌────┬────┬────┬────┬────┬────┐
//!       │ favor   │ contra  │ neutral │
//!       │ lo   hi │ lo   hi │ lo   hi │
//!       └────┴────┴────┴────┴────┴────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Wire size of one slave record.
pub const PACKET_SIZE: usize = 6;

/// One slave's opinion tally over its sample window.
///
/// The master trusts the wire values: no cross-field validation against
/// the slave's sample budget is performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tally {
    pub favor: u16,
    pub contra: u16,
    pub neutral: u16,
}

impl Tally {
    pub const fn new(favor: u16, contra: u16, neutral: u16) -> Self {
        Self {
            favor,
            contra,
            neutral,
        }
    }

    /// Sum of the three counters.
    pub fn total(&self) -> u32 {
        u32::from(self.favor) + u32::from(self.contra) + u32::from(self.neutral)
    }

    /// Encode in wire order.  Used by the bus simulator and tests.
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let f = self.favor.to_le_bytes();
        let c = self.contra.to_le_bytes();
        let n = self.neutral.to_le_bytes();
        [f[0], f[1], c[0], c[1], n[0], n[1]]
    }
}

/// Decode a raw slave payload.
///
/// A payload of any length other than [`PACKET_SIZE`] is a
/// [`TransportError::BusError`]; it is never truncated or padded.
pub fn decode(payload: &[u8]) -> Result<Tally, TransportError> {
    let bytes: &[u8; PACKET_SIZE] = payload
        .try_into()
        .map_err(|_| TransportError::BusError)?;
    Ok(Tally {
        favor: u16::from_le_bytes([bytes[0], bytes[1]]),
        contra: u16::from_le_bytes([bytes[2], bytes[3]]),
        neutral: u16::from_le_bytes([bytes[4], bytes[5]]),
    })
}
