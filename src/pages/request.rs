use actix_web::{dev, get, post, put, web, FromRequest, HttpRequest, HttpResponse};
use chrono::{Local, NaiveDate, NaiveTime};
use futures_util::future::LocalBoxFuture;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{Approver, Session},
    entity::{prelude::*, sea_orm_active_enums::{WorkRequestKind, WorkRequestStatus}, work_request},
    error::ApiError,
    pages::parse_id,
    payroll::Period,
    time_of_day::TimeOfDay,
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_request)
        .service(get_requests)
        .service(update_request_status);
}

#[derive(Debug, Serialize, Deserialize)]
struct CreateWorkRequest {
    title: WorkRequestKind,
    date: NaiveDate,
    start_hour: TimeOfDay,
    end_hour: TimeOfDay,
    fuel: Option<i64>,
    #[serde(default)]
    reason: String,
    supervisor_id: Option<Uuid>,
}

impl CreateWorkRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.start_hour.minutes_until(self.end_hour).is_none() {
            return Err(ApiError::validation(format!(
                "end_hour ({}) must be later than start_hour ({})", self.end_hour, self.start_hour
            )));
        }

        match (self.title, self.fuel) {
            (WorkRequestKind::Ot, Some(_)) => Err(ApiError::validation("fuel is only allowed on FIELD_WORK requests")),
            (_, Some(fuel)) if fuel < 0 => Err(ApiError::validation("fuel must not be negative")),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RequestQuery {
    #[serde(rename = "userId", alias = "user_id")]
    user_id: Option<Uuid>,
    title: Option<WorkRequestKind>,
    status: Option<WorkRequestStatus>,
    month: Option<u32>,
    year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DecideWorkRequest {
    status: WorkRequestStatus,
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkRequestResponse {
    message: String,
    request: work_request::Model,
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkRequestListResponse {
    message: String,
    count: usize,
    requests: Vec<work_request::Model>,
}

impl FromRequest for work_request::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let Some(request_id) = req.match_info().get("request_id") else {
                return Err(actix_web::error::ErrorInternalServerError("request extractor used outside a `request_id` path"))
            };
            let request_id = parse_id(request_id, "request_id")?;

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not configured"))
            };

            let Some(request) = WorkRequest::find_by_id(request_id)
                .one(db.get_ref()).await.map_err(ApiError::from)?
            else {
                return Err(ApiError::NotFound("Request").into())
            };

            Ok(request)
        })
    }
}

#[post("")]
async fn create_request(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<CreateWorkRequest>) -> Result<HttpResponse, ApiError> {
    payload.validate()?;

    let payload = payload.into_inner();
    let now = Local::now().fixed_offset();

    let request = WorkRequest::insert(work_request::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        user_id: Set(session.id),
        supervisor_id: Set(payload.supervisor_id),
        date: Set(payload.date),
        title: Set(payload.title),
        start_hour: Set(NaiveTime::from(payload.start_hour)),
        end_hour: Set(NaiveTime::from(payload.end_hour)),
        fuel: Set(payload.fuel),
        reason: Set(payload.reason),
        status: Set(WorkRequestStatus::Pending),
        ..Default::default()
    }).exec_with_returning(db.get_ref()).await?;

    info!(request_id = %request.id, user_id = %session.id, title = ?request.title, "work request submitted");

    Ok(HttpResponse::Created().json(WorkRequestResponse {
        message: "Request created successfully".to_string(),
        request,
    }))
}

#[get("")]
async fn get_requests(db: web::Data<DatabaseConnection>, session: Session, query: web::Query<RequestQuery>) -> Result<HttpResponse, ApiError> {
    let user_id = match query.user_id {
        Some(user_id) if !session.can_view(user_id) => {
            return Err(ApiError::Forbidden("cannot view another employee's requests"));
        },
        Some(user_id) => Some(user_id),
        None if session.is_approver() => None,
        None => Some(session.id),
    };

    let mut select = WorkRequest::find();

    if let Some(user_id) = user_id {
        select = select.filter(work_request::Column::UserId.eq(user_id));
    }
    if let Some(title) = query.title {
        select = select.filter(work_request::Column::Title.eq(title));
    }
    if let Some(status) = query.status {
        select = select.filter(work_request::Column::Status.eq(status));
    }

    match (query.month, query.year) {
        (None, None) => {},
        (None, Some(year)) => {
            let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| ApiError::validation(format!("invalid year {year}")))?;
            let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| ApiError::validation(format!("invalid year {year}")))?;

            select = select.filter(work_request::Column::Date.between(first, last));
        },
        (month, year) => {
            let period = Period::resolve(month, year, Local::now().date_naive())?;

            select = select.filter(work_request::Column::Date.between(period.first_day(), period.last_day()));
        },
    }

    let requests = select
        .order_by_desc(work_request::Column::Date)
        .all(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(WorkRequestListResponse {
        message: "Requests retrieved successfully".to_string(),
        count: requests.len(),
        requests,
    }))
}

#[put("/{request_id}/status")]
async fn update_request_status(
    db: web::Data<DatabaseConnection>,
    approver: Approver,
    request: work_request::Model,
    payload: web::Json<DecideWorkRequest>,
) -> Result<HttpResponse, ApiError> {
    if payload.status == WorkRequestStatus::Pending {
        return Err(ApiError::validation("status must be Accept or Reject"));
    }

    if !approver.is_admin() && request.supervisor_id != Some(approver.id) {
        return Err(ApiError::Forbidden("request is addressed to another supervisor"));
    }

    if request.status != WorkRequestStatus::Pending {
        return Err(ApiError::AlreadyDecided("Request"));
    }

    let request = WorkRequest::update(work_request::ActiveModel {
        id: Unchanged(request.id),
        updated_at: Set(Local::now().fixed_offset()),
        status: Set(payload.status),
        ..Default::default()
    }).exec(db.get_ref()).await?;

    info!(request_id = %request.id, status = ?request.status, by = %approver.id, "work request decided");

    Ok(HttpResponse::Ok().json(WorkRequestResponse {
        message: "Request status updated successfully".to_string(),
        request,
    }))
}
