use chrono::{DateTime, Datelike as _, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, utils};

/// A payroll month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self, ApiError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ApiError::validation(format!("invalid period {month}/{year}, month must be between 1 and 12")));
        }

        Ok(Self { month, year })
    }

    /// Fills missing parts from `today`
    pub fn resolve(month: Option<u32>, year: Option<i32>, today: NaiveDate) -> Result<Self, ApiError> {
        Self::new(month.unwrap_or(today.month()), year.unwrap_or(today.year()))
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        utils::last_day_of_month(self.first_day())
    }

    /// `[first day 00:00:00, last day 23:59:59]`
    pub fn window(&self) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        utils::day_range(self.first_day(), self.last_day())
    }

    /// The whole calendar year the month belongs to
    pub fn year_window(&self) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        let first = NaiveDate::from_ymd_opt(self.year, 1, 1).unwrap_or_default();
        let last = NaiveDate::from_ymd_opt(self.year, 12, 31).unwrap_or_default();

        utils::day_range(first, last)
    }

    pub fn working_days(&self) -> i64 {
        utils::count_working_days(self.first_day(), self.last_day())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;

    #[test]
    fn test_resolve_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();

        assert_eq!(Period::resolve(None, None, today).unwrap(), Period { month: 3, year: 2025 });
        assert_eq!(Period::resolve(Some(6), None, today).unwrap(), Period { month: 6, year: 2025 });
        assert_eq!(Period::resolve(None, Some(2024), today).unwrap(), Period { month: 3, year: 2024 });
    }

    #[test]
    fn test_rejects_invalid_month() {
        assert!(Period::new(0, 2025).is_err());
        assert!(Period::new(13, 2025).is_err());
    }

    #[test]
    fn test_window() {
        let (start, end) = Period::new(6, 2025).unwrap().window();

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap().fixed_offset());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap().fixed_offset());
    }

    #[test]
    fn test_year_window() {
        let (start, end) = Period::new(6, 2025).unwrap().year_window();

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().fixed_offset());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap().fixed_offset());
    }

    #[test]
    fn test_working_days() {
        assert_eq!(Period::new(6, 2025).unwrap().working_days(), 21);
    }
}
