//! Cycle timestamps.
//!
//! A snapshot is stamped with wall-clock time when the DS3231 RTC answers,
//! and with monotonic uptime otherwise.  The cycle never fails for lack of
//! a clock.
//!
//! The DS3231 keeps its time in seven BCD registers starting at `0x00`:
//!
//! | reg  | field   | notes                                  |
//! |------|---------|----------------------------------------|
//! | 0x00 | seconds | 0–59                                   |
//! | 0x01 | minutes | 0–59                                   |
//! | 0x02 | hours   | bit 6 = 12 h mode, bit 5 = PM in 12 h  |
//! | 0x03 | weekday | 1–7, ignored                           |
//! | 0x04 | date    | 1–31                                   |
//! | 0x05 | month   | bit 7 = century                        |
//! | 0x06 | year    | 0–99                                   |

use core::fmt;

use serde::{Deserialize, Serialize};

/// 7-bit address of the DS3231 real-time clock.
pub const DS3231_ADDRESS: u8 = 0x68;
/// First time-keeping register.
pub const DS3231_REG_SECONDS: u8 = 0x00;
/// Number of time-keeping registers read in one burst.
pub const DS3231_TIME_REGS: usize = 7;

/// Calendar date and time of day (no time zone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Convert seconds since 1970-01-01T00:00:00 into a calendar value.
    pub fn from_unix(secs: u64) -> Self {
        let days = (secs / 86_400) as i64;
        let rem = secs % 86_400;
        let (year, month, day) = civil_from_days(days);
        Self {
            year: year as u16,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: ((rem % 3600) / 60) as u8,
            second: (rem % 60) as u8,
        }
    }

    /// Seconds since 1970-01-01T00:00:00 (saturating at the epoch).
    pub fn to_unix(&self) -> u64 {
        let y = i64::from(self.year) - i64::from(self.month <= 2);
        let era = y.div_euclid(400);
        let yoe = y.rem_euclid(400);
        let m = i64::from(self.month);
        let mp = if m > 2 { m - 3 } else { m + 9 };
        let doy = (153 * mp + 2) / 5 + i64::from(self.day) - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        let days = era * 146_097 + doe - 719_468;
        let secs = days * 86_400
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second);
        secs.max(0) as u64
    }

    /// Decode the seven DS3231 time registers.
    ///
    /// Returns `None` when any field is out of range, which is what an
    /// oscillator-stopped or never-set chip usually reports.
    pub fn from_ds3231(regs: &[u8; DS3231_TIME_REGS]) -> Option<Self> {
        let second = bcd_to_bin(regs[0] & 0x7F)?;
        let minute = bcd_to_bin(regs[1] & 0x7F)?;
        let hour = if regs[2] & 0x40 != 0 {
            let h12 = bcd_to_bin(regs[2] & 0x1F)?;
            if !(1..=12).contains(&h12) {
                return None;
            }
            let pm = regs[2] & 0x20 != 0;
            match (h12, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, false) => h,
                (h, true) => h + 12,
            }
        } else {
            bcd_to_bin(regs[2] & 0x3F)?
        };
        let day = bcd_to_bin(regs[4] & 0x3F)?;
        let month = bcd_to_bin(regs[5] & 0x1F)?;
        let century = if regs[5] & 0x80 != 0 { 100 } else { 0 };
        let year = 2000 + century + u16::from(bcd_to_bin(regs[6])?);

        let dt = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        dt.is_valid().then_some(dt)
    }

    /// Encode into DS3231 register layout (24 h mode, weekday left at 1).
    pub fn to_ds3231(&self) -> [u8; DS3231_TIME_REGS] {
        let yy = self.year.saturating_sub(2000);
        let century = if yy >= 100 { 0x80 } else { 0 };
        [
            bin_to_bcd(self.second),
            bin_to_bcd(self.minute),
            bin_to_bcd(self.hour),
            1,
            bin_to_bcd(self.day),
            bin_to_bcd(self.month) | century,
            bin_to_bcd((yy % 100) as u8),
        ]
    }

    fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Timestamp attached to every cycle snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timestamp {
    /// Wall-clock time from the RTC.
    Wall(DateTime),
    /// Placeholder when no RTC is available: milliseconds since boot.
    Uptime { millis: u64 },
}

impl Timestamp {
    pub fn is_wall(&self) -> bool {
        matches!(self, Self::Wall(_))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wall(dt) => write!(f, "{dt}"),
            Self::Uptime { millis } => {
                write!(f, "uptime+{}.{:03}s", millis / 1000, millis % 1000)
            }
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn bcd_to_bin(v: u8) -> Option<u8> {
    let hi = v >> 4;
    let lo = v & 0x0F;
    (hi < 10 && lo < 10).then_some(hi * 10 + lo)
}

fn bin_to_bcd(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

fn is_leap(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

// Howard Hinnant's days-to-civil algorithm.
fn civil_from_days(z: i64) -> (i64, u8, u8) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
