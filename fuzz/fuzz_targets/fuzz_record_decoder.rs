//! Fuzz target: `slaves::record::decode`
//!
//! Drives arbitrary byte sequences into the slave record decoder and
//! asserts that it never panics, accepts exactly one payload length, and
//! that every accepted payload re-encodes to the same bytes.
//!
//! cargo fuzz run fuzz_record_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use tallymaster::clock::Timestamp;
use tallymaster::slaves::aggregate::aggregate;
use tallymaster::slaves::record::{PACKET_SIZE, decode};
use tallymaster::slaves::{SlaveAddress, SlaveOutcome, SlaveResult};

fuzz_target!(|data: &[u8]| {
    match decode(data) {
        Ok(tally) => {
            assert_eq!(data.len(), PACKET_SIZE, "decoder accepted a wrong-length payload");
            assert_eq!(&tally.to_bytes()[..], data);

            // A decoded tally always aggregates without overflow.
            let result = SlaveResult {
                address: SlaveAddress(0x10),
                outcome: SlaveOutcome::Ok(tally),
                attempts: 1,
            };
            let snap = aggregate(1, Timestamp::Uptime { millis: 0 }, &[result; 16]);
            assert_eq!(snap.totals.total(), 16 * tally.total());
        }
        Err(_) => assert_ne!(data.len(), PACKET_SIZE),
    }
});
