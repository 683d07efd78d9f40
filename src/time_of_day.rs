//! Time of day with minute precision.
//!
//! Request bodies carry working hours either as `"HH:mm"` strings or as decimal
//! hours (`8.5`, `"8.5"`). Both land in [`TimeOfDay`], which is also what the
//! ledger stores, so hour arithmetic never truncates minutes.

use std::{fmt, str::FromStr};

use chrono::{NaiveTime, Timelike as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    minutes: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a valid time of day, expected `HH:mm` or decimal hours")]
pub struct TimeOfDayError(String);

impl TimeOfDay {
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }

        Some(Self { minutes: hour * 60 + minute })
    }

    pub fn from_decimal_hours(hours: f64) -> Option<Self> {
        if !hours.is_finite() || hours < 0.0 {
            return None;
        }

        let minutes = (hours * 60.0).round();
        if minutes >= f64::from(MINUTES_PER_DAY) {
            return None;
        }

        // Bounded by MINUTES_PER_DAY above
        Some(Self { minutes: minutes as u16 })
    }

    pub fn hour(self) -> u16 {
        self.minutes / 60
    }

    pub fn minute(self) -> u16 {
        self.minutes % 60
    }

    /// Minutes from `self` until `end`, `None` unless `end` is strictly later
    pub fn minutes_until(self, end: TimeOfDay) -> Option<u16> {
        end.minutes.checked_sub(self.minutes).filter(|m| *m > 0)
    }

    pub fn hours_until(self, end: TimeOfDay) -> Option<f64> {
        self.minutes_until(end).map(|m| f64::from(m) / 60.0)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || TimeOfDayError(s.to_string());

        match trimmed.split_once(':') {
            Some((hour, minute)) => {
                if hour.is_empty() || minute.len() != 2 {
                    return Err(invalid());
                }

                let hour = hour.parse::<u16>().map_err(|_| invalid())?;
                let minute = minute.parse::<u16>().map_err(|_| invalid())?;

                Self::from_hm(hour, minute).ok_or_else(invalid)
            },
            None => {
                let hours = trimmed.parse::<f64>().map_err(|_| invalid())?;

                Self::from_decimal_hours(hours).ok_or_else(invalid)
            },
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        // `NaiveTime` hours and minutes always fit a day
        Self { minutes: (time.hour() * 60 + time.minute()) as u16 }
    }
}

impl From<TimeOfDay> for NaiveTime {
    fn from(time: TimeOfDay) -> Self {
        NaiveTime::from_hms_opt(u32::from(time.hour()), u32::from(time.minute()), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Hours(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Raw::Hours(hours) => Self::from_decimal_hours(hours)
                .ok_or_else(|| serde::de::Error::custom(TimeOfDayError(hours.to_string()))),
        }
    }
}
