use chrono::{DateTime, Datelike as _, FixedOffset, Months, NaiveDate, NaiveTime, TimeDelta};

use crate::consts::WEEKEND;

/// Start (00:00:00) and end (23:59:59) of the given days, in UTC
pub fn day_range(first: NaiveDate, last: NaiveDate) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);

    (
        first.and_time(NaiveTime::MIN).and_utc().fixed_offset(),
        last.and_time(end_of_day).and_utc().fixed_offset(),
    )
}

pub fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    first.checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

pub fn count_working_days(mut start: NaiveDate, end: NaiveDate) -> i64 {
    let mut working_days = 0;

    while start <= end {
        if !WEEKEND.contains(&start.weekday()) {
            working_days += 1;
        }

        let Some(next) = start.succ_opt() else { break };
        start = next;
    }

    working_days
}

/// Whole days between two instants, counting both ends
pub fn inclusive_day_count(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> i64 {
    (end - start).num_milliseconds().div_euclid(TimeDelta::days(1).num_milliseconds()) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone as _, Utc};

    #[test]
    fn test_day_range() {
        let date = NaiveDate::from_ymd_opt(2023, 10, 10).unwrap();

        let (start, end) = day_range(date, date);

        assert_eq!(start, Utc.with_ymd_and_hms(2023, 10, 10, 0, 0, 0).unwrap().fixed_offset());
        assert_eq!(end, Utc.with_ymd_and_hms(2023, 10, 10, 23, 59, 59).unwrap().fixed_offset());
    }

    #[test]
    fn test_last_day_of_month() {
        let feb_leap = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let dec = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();

        assert_eq!(last_day_of_month(feb_leap), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(last_day_of_month(dec), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_count_working_days() {
        let period_start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let period_end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        assert_eq!(count_working_days(period_start, period_end), 20);
    }

    #[test]
    fn test_inclusive_day_count() {
        let start = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap().fixed_offset();
        let same_day = Utc.with_ymd_and_hms(2025, 6, 10, 17, 0, 0).unwrap().fixed_offset();
        let end = Utc.with_ymd_and_hms(2025, 6, 12, 9, 0, 0).unwrap().fixed_offset();
        let almost = Utc.with_ymd_and_hms(2025, 6, 12, 8, 59, 0).unwrap().fixed_offset();

        assert_eq!(inclusive_day_count(start, same_day), 1);
        assert_eq!(inclusive_day_count(start, end), 3);
        assert_eq!(inclusive_day_count(start, almost), 2);
    }
}
