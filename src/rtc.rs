//! Real time clock registers (0x0200..=0x0206)
//!
//! Every field is stored as binary-coded decimal: tens in the high nibble,
//! units in the low nibble.

use crate::error::{Error, Result};
use chrono::{Datelike, Timelike};
use std::ops::RangeInclusive;

const TWELVE_HOUR: u8 = 0b0100_0000;
const PM: u8 = 0b0010_0000;
const CENTURY: u8 = 0b1000_0000;

/// Hour register layout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HourMode {
    /// Bit 6 clear, tens of hours in bits 5-4
    #[default]
    TwentyFour,
    /// Bit 6 set, bit 5 PM, tens of hours in bit 4
    Twelve,
}

/// Packs a value below 100 into binary-coded decimal.
pub fn bcd(value: u8) -> u8 {
    debug_assert!(value < 100);
    (value / 10) << 4 | value % 10
}

/// Encodes `hour` (0-23).
pub fn hours(hour: u8, mode: HourMode) -> u8 {
    match mode {
        HourMode::TwentyFour => bcd(hour),
        HourMode::Twelve => {
            let pm = if hour >= 12 { PM } else { 0 };
            let hour = match hour % 12 {
                0 => 12,
                hour => hour,
            };
            TWELVE_HOUR | pm | bcd(hour)
        }
    }
}

/// The seven RTC registers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rtc {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    /// 1 (Sunday) to 7
    pub day_of_week: u8,
    pub date: u8,
    pub month: u8,
    pub year: i32,
    pub mode: HourMode,
}

impl Rtc {
    /// RTC fields from a wall clock time, 24-hour mode.
    pub fn new<T: Datelike + Timelike>(time: &T) -> Self {
        Self {
            seconds: time.second() as _,
            minutes: time.minute() as _,
            hours: time.hour() as _,
            day_of_week: time.weekday().number_from_sunday() as _,
            date: time.day() as _,
            month: time.month() as _,
            year: time.year(),
            mode: HourMode::TwentyFour,
        }
    }

    /// Register payload, seconds first. The century flag rides on the month
    /// register and is set from the year 2000 on.
    ///
    /// Fails for a field the registers cannot hold, years outside 1900-2099
    /// included.
    pub fn to_bytes(&self) -> Result<[u8; 7]> {
        field("seconds", self.seconds.into(), 0..=59)?;
        field("minutes", self.minutes.into(), 0..=59)?;
        field("hours", self.hours.into(), 0..=23)?;
        field("day_of_week", self.day_of_week.into(), 1..=7)?;
        field("date", self.date.into(), 1..=31)?;
        field("month", self.month.into(), 1..=12)?;
        field("year", self.year, 1900..=2099)?;
        let century = if self.year >= 2000 { CENTURY } else { 0 };
        Ok([
            bcd(self.seconds),
            bcd(self.minutes),
            hours(self.hours, self.mode),
            self.day_of_week,
            bcd(self.date),
            century | bcd(self.month),
            bcd((self.year % 100) as _),
        ])
    }
}

fn field(name: &'static str, value: i32, range: RangeInclusive<i32>) -> Result<()> {
    if !range.contains(&value) {
        return Err(Error::Rtc { field: name, value });
    }
    Ok(())
}

impl<T: Datelike + Timelike> From<&T> for Rtc {
    fn from(value: &T) -> Self {
        Self::new(value)
    }
}
