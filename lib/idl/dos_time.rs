//! Packed DOS date and time, the timestamp resolution stored in identifiers.
use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime, Timelike as _, Utc};

const EPOCH_YEAR: i32 = 1980;
const LAST_YEAR: i32 = EPOCH_YEAR + 127;

/// A last-write timestamp at two-second resolution.
///
/// Ordering compares the date first and the time second, matching the packed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DosDateTime {
    /// `((year - 1980) << 9) | (month << 5) | day`
    pub date: u16,
    /// `(hour << 11) | (minute << 5) | (second / 2)`
    pub time: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const MIN: Self = Self {
        date: (1 << 5) | 1,
        time: 0,
    };

    /// 2107-12-31 23:59:58, the latest representable instant.
    pub const MAX: Self = Self {
        date: (127 << 9) | (12 << 5) | 31,
        time: (23 << 11) | (59 << 5) | 29,
    };

    /// Pack a calendar timestamp, clamping to the representable range.
    #[must_use]
    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        match dt.year() {
            y if y < EPOCH_YEAR => Self::MIN,
            y if y > LAST_YEAR => Self::MAX,
            y => {
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "year offset is within 0..=127 after the range check"
                )]
                let years = (y - EPOCH_YEAR) as u16;
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "calendar components fit in a u16"
                )]
                let (month, day, hour, minute, second) = (
                    dt.month() as u16,
                    dt.day() as u16,
                    dt.hour() as u16,
                    dt.minute() as u16,
                    dt.second() as u16,
                );
                Self {
                    date: (years << 9) | (month << 5) | day,
                    time: (hour << 11) | (minute << 5) | (second / 2),
                }
            }
        }
    }

    /// Pack a wall-clock instant, interpreted in UTC.
    #[must_use]
    pub fn from_system_time(t: SystemTime) -> Self {
        let dt: DateTime<Utc> = t.into();
        Self::from_datetime(&dt.naive_utc())
    }

    /// Unpack into a calendar timestamp, or `None` if the fields do not name a real date.
    #[must_use]
    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        let year = EPOCH_YEAR + i32::from(self.date >> 9);
        let month = u32::from((self.date >> 5) & 0x0F);
        let day = u32::from(self.date & 0x1F);
        let hour = u32::from(self.time >> 11);
        let minute = u32::from((self.time >> 5) & 0x3F);
        let second = u32::from(self.time & 0x1F) * 2;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }
}

impl fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            None => write!(f, "{:04x}:{:04x}", self.date, self.time),
        }
    }
}
