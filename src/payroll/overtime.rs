//! Overtime aggregation.
//!
//! Accepted OT requests are turned into hour entries split into weekday and
//! weekend buckets. Entries derived from the ledger never carry money, OT pay is
//! entered by hand as manual entries which are merged into the same buckets.

use chrono::{Datelike as _, NaiveDate};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    consts::WEEKEND,
    entity::{prelude::*, sea_orm_active_enums::{WorkRequestKind, WorkRequestStatus}, work_request},
    time_of_day::TimeOfDay,
};

use super::{AggregationError, Period};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Weekday,
    Weekend,
}

impl DayKind {
    pub fn of(date: NaiveDate) -> Self {
        if WEEKEND.contains(&date.weekday()) {
            DayKind::Weekend
        } else {
            DayKind::Weekday
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtDetail {
    pub date: NaiveDate,
    pub hours: f64,
    pub day_kind: DayKind,
    pub is_manual: bool,
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
}

impl OtDetail {
    /// Entry for an accepted OT request, `None` when it spans no time
    pub fn from_request(request: &work_request::Model) -> Option<Self> {
        let start = TimeOfDay::from(request.start_hour);
        let end = TimeOfDay::from(request.end_hour);
        let hours = start.hours_until(end)?;

        Some(Self {
            date: request.date,
            hours,
            day_kind: DayKind::of(request.date),
            is_manual: false,
            amount: 0,
            request_id: Some(request.id),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OvertimeSummary {
    pub total_amount: i64,
    pub total_hours: f64,
    pub details: Vec<OtDetail>,
    pub weekday_ot_hours: f64,
    pub weekend_ot_hours: f64,
    pub weekday_ot_amount: i64,
    pub weekend_ot_amount: i64,
}

impl OvertimeSummary {
    pub fn from_requests<'a>(requests: impl IntoIterator<Item = &'a work_request::Model>) -> Self {
        let mut summary = Self::default();

        for request in requests {
            match OtDetail::from_request(request) {
                Some(detail) => summary.push(detail),
                None => debug!(request_id = %request.id, "skipping overtime request without positive hours"),
            }
        }

        summary
    }

    pub fn push(&mut self, detail: OtDetail) {
        match detail.day_kind {
            DayKind::Weekday => {
                self.weekday_ot_hours += detail.hours;
                self.weekday_ot_amount += detail.amount;
            },
            DayKind::Weekend => {
                self.weekend_ot_hours += detail.hours;
                self.weekend_ot_amount += detail.amount;
            },
        }

        self.total_hours += detail.hours;
        self.total_amount += detail.amount;
        self.details.push(detail);
    }

    /// Adds manual entries on top of the derived ones
    pub fn merge_manual(mut self, manual: impl IntoIterator<Item = OtDetail>) -> Self {
        for detail in manual {
            self.push(OtDetail { is_manual: true, ..detail });
        }

        self
    }
}

pub async fn accepted_overtime<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    period: Period,
) -> Result<Vec<work_request::Model>, AggregationError> {
    WorkRequest::find()
        .filter(work_request::Column::UserId.eq(user_id))
        .filter(work_request::Column::Title.eq(WorkRequestKind::Ot))
        .filter(work_request::Column::Status.eq(WorkRequestStatus::Accept))
        .filter(work_request::Column::Date.between(period.first_day(), period.last_day()))
        .order_by_asc(work_request::Column::Date)
        .all(db).await
        .map_err(|source| AggregationError::Ledger { ledger: "overtime", source })
}

pub async fn aggregate<C: ConnectionTrait>(db: &C, user_id: Uuid, period: Period) -> Result<OvertimeSummary, AggregationError> {
    let requests = accepted_overtime(db, user_id, period).await?;

    Ok(OvertimeSummary::from_requests(&requests))
}
