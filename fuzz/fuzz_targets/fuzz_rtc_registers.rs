//! Fuzz target: `clock::DateTime::from_ds3231`
//!
//! Feeds arbitrary register dumps through the DS3231 decoder.  Garbage
//! must be rejected, never panic, and anything accepted must be a real
//! calendar time that survives a unix round trip.
//!
//! cargo fuzz run fuzz_rtc_registers

#![no_main]

use libfuzzer_sys::fuzz_target;
use tallymaster::clock::{DS3231_TIME_REGS, DateTime};

fuzz_target!(|data: &[u8]| {
    let Ok(regs) = <[u8; DS3231_TIME_REGS]>::try_from(data) else {
        return;
    };
    if let Some(dt) = DateTime::from_ds3231(&regs) {
        assert!((1..=12).contains(&dt.month));
        assert!((1..=31).contains(&dt.day));
        assert!(dt.hour < 24 && dt.minute < 60 && dt.second < 60);
        assert_eq!(DateTime::from_unix(dt.to_unix()), dt);
    }
});
