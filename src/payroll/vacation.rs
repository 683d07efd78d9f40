//! Day-off usage and vacation balance.

use chrono::{DateTime, FixedOffset};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    consts::{HALF_DAY_VALUE, LOW_VACATION_THRESHOLD},
    entity::{day_off_request, prelude::*, sea_orm_active_enums::{DayOffStatus, DayOffType}},
    error::ApiError,
    utils,
};

use super::{AggregationError, Period};

/// Vacation days a leave consumes
pub fn date_off_number(
    day_off_type: DayOffType,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<f64, ApiError> {
    if end < start {
        return Err(ApiError::validation("end_date_time must not be earlier than start_date_time"));
    }

    match day_off_type {
        DayOffType::HalfDay => {
            if start.date_naive() != end.date_naive() {
                return Err(ApiError::validation("a half day off must start and end on the same day"));
            }

            Ok(HALF_DAY_VALUE)
        },
        // Leave spans are a handful of days
        DayOffType::FullDay => Ok(utils::inclusive_day_count(start, end) as f64),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VacationSignal {
    Red,
    Yellow,
    Green,
}

impl VacationSignal {
    pub fn of(remaining: f64) -> Self {
        if remaining < 0.0 {
            VacationSignal::Red
        } else if remaining <= LOW_VACATION_THRESHOLD {
            VacationSignal::Yellow
        } else {
            VacationSignal::Green
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VacationSummary {
    pub total_vacation_days: f64,
    pub day_off_days: f64,
    pub used_vacation_days_this_year: f64,
    /// Allotment minus this month's usage
    pub remaining_vacation_days: f64,
    pub exceed_days: f64,
    pub signal: VacationSignal,
}

impl VacationSummary {
    pub fn new(total_vacation_days: f64, day_off_days: f64, used_vacation_days_this_year: f64) -> Self {
        let remaining_vacation_days = total_vacation_days - day_off_days;

        Self {
            total_vacation_days,
            day_off_days,
            used_vacation_days_this_year,
            remaining_vacation_days,
            exceed_days: (day_off_days - total_vacation_days).max(0.0),
            signal: VacationSignal::of(remaining_vacation_days),
        }
    }
}

pub fn total_days_off<'a>(requests: impl IntoIterator<Item = &'a day_off_request::Model>) -> f64 {
    requests.into_iter().map(|r| r.date_off_number).sum()
}

async fn accepted_days_off<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    (from, to): (DateTime<FixedOffset>, DateTime<FixedOffset>),
) -> Result<f64, AggregationError> {
    let requests = DayOffRequest::find()
        .filter(day_off_request::Column::UserId.eq(user_id))
        .filter(day_off_request::Column::Status.eq(DayOffStatus::Accepted))
        .filter(day_off_request::Column::StartDateTime.between(from, to))
        .all(db).await
        .map_err(|source| AggregationError::Ledger { ledger: "day-off", source })?;

    Ok(total_days_off(&requests))
}

pub async fn month_days_off<C: ConnectionTrait>(db: &C, user_id: Uuid, period: Period) -> Result<f64, AggregationError> {
    accepted_days_off(db, user_id, period.window()).await
}

pub async fn year_days_off<C: ConnectionTrait>(db: &C, user_id: Uuid, period: Period) -> Result<f64, AggregationError> {
    accepted_days_off(db, user_id, period.year_window()).await
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap().fixed_offset()
    }

    #[test]
    fn test_full_day_span_is_inclusive() {
        assert_eq!(date_off_number(DayOffType::FullDay, at(10, 0), at(12, 0)).unwrap(), 3.0);
        assert_eq!(date_off_number(DayOffType::FullDay, at(10, 9), at(10, 17)).unwrap(), 1.0);
    }

    #[test]
    fn test_half_day_is_half() {
        assert_eq!(date_off_number(DayOffType::HalfDay, at(10, 8), at(10, 12)).unwrap(), 0.5);
        assert!(date_off_number(DayOffType::HalfDay, at(10, 8), at(11, 12)).is_err());
    }

    #[test]
    fn test_rejects_reversed_span() {
        assert!(date_off_number(DayOffType::FullDay, at(12, 0), at(10, 0)).is_err());
    }

    #[test]
    fn test_signal_tiers() {
        assert_eq!(VacationSignal::of(-0.5), VacationSignal::Red);
        assert_eq!(VacationSignal::of(0.0), VacationSignal::Yellow);
        assert_eq!(VacationSignal::of(5.0), VacationSignal::Yellow);
        assert_eq!(VacationSignal::of(5.5), VacationSignal::Green);
    }

    #[test]
    fn test_summary_subtracts_month_usage() {
        let summary = VacationSummary::new(12.0, 3.0, 7.0);

        assert_eq!(summary.remaining_vacation_days, 9.0);
        assert_eq!(summary.exceed_days, 0.0);
        assert_eq!(summary.signal, VacationSignal::Green);
    }

    #[test]
    fn test_summary_tracks_deficit() {
        let summary = VacationSummary::new(2.0, 3.5, 3.5);

        assert_eq!(summary.remaining_vacation_days, -1.5);
        assert_eq!(summary.exceed_days, 1.5);
        assert_eq!(summary.signal, VacationSignal::Red);
    }
}
