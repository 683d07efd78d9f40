use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::{prelude::*, sea_orm_active_enums::{WorkRequestKind, WorkRequestStatus}, work_request};

use super::{AggregationError, Period};

pub fn total_fuel<'a>(requests: impl IntoIterator<Item = &'a work_request::Model>) -> i64 {
    requests.into_iter().filter_map(|r| r.fuel).sum()
}

/// Fuel reimbursed for accepted field work within the period
pub async fn aggregate<C: ConnectionTrait>(db: &C, user_id: Uuid, period: Period) -> Result<i64, AggregationError> {
    let requests = WorkRequest::find()
        .filter(work_request::Column::UserId.eq(user_id))
        .filter(work_request::Column::Title.eq(WorkRequestKind::FieldWork))
        .filter(work_request::Column::Status.eq(WorkRequestStatus::Accept))
        .filter(work_request::Column::Date.between(period.first_day(), period.last_day()))
        .filter(work_request::Column::Fuel.is_not_null())
        .all(db).await
        .map_err(|source| AggregationError::Ledger { ledger: "field work", source })?;

    Ok(total_fuel(&requests))
}
