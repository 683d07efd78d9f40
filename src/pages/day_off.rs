use actix_web::{delete, dev, get, post, put, web, FromRequest, HttpRequest, HttpResponse};
use chrono::{DateTime, FixedOffset, Local};
use futures_util::future::LocalBoxFuture;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{Approver, Session},
    entity::{day_off_request, prelude::*, sea_orm_active_enums::{DayOffStatus, DayOffType}},
    error::ApiError,
    pages::parse_id,
    payroll::{vacation::date_off_number, Period},
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_day_off)
        .service(get_day_offs)
        .service(update_day_off_status)
        .service(update_day_off)
        .service(delete_day_off);
}

#[derive(Debug, Serialize, Deserialize)]
struct CreateDayOff {
    day_off_type: DayOffType,
    start_date_time: DateTime<FixedOffset>,
    end_date_time: DateTime<FixedOffset>,
    #[serde(default)]
    title: String,
    supervisor_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UpdateDayOff {
    day_off_type: Option<DayOffType>,
    start_date_time: Option<DateTime<FixedOffset>>,
    end_date_time: Option<DateTime<FixedOffset>>,
    title: Option<String>,
    supervisor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct DayOffQuery {
    #[serde(rename = "userId", alias = "user_id")]
    user_id: Option<Uuid>,
    status: Option<DayOffStatus>,
    month: Option<u32>,
    year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DecideDayOff {
    status: DayOffStatus,
}

#[derive(Debug, Serialize, Deserialize)]
struct DayOffResponse {
    message: String,
    day_off: day_off_request::Model,
}

#[derive(Debug, Serialize, Deserialize)]
struct DayOffListResponse {
    message: String,
    count: usize,
    day_offs: Vec<day_off_request::Model>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageResponse {
    message: String,
}

impl FromRequest for day_off_request::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let Some(day_off_id) = req.match_info().get("day_off_id") else {
                return Err(actix_web::error::ErrorInternalServerError("day-off extractor used outside a `day_off_id` path"))
            };
            let day_off_id = parse_id(day_off_id, "day_off_id")?;

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not configured"))
            };

            let Some(day_off) = DayOffRequest::find_by_id(day_off_id)
                .one(db.get_ref()).await.map_err(ApiError::from)?
            else {
                return Err(ApiError::NotFound("Day-off request").into())
            };

            Ok(day_off)
        })
    }
}

/// Owner (or an admin) editing a request nobody has decided on yet
fn ensure_editable(session: &Session, day_off: &day_off_request::Model) -> Result<(), ApiError> {
    if day_off.user_id != session.id && !session.is_admin() {
        return Err(ApiError::Forbidden("only the owner can change a day-off request"));
    }

    if day_off.status != DayOffStatus::Pending {
        return Err(ApiError::AlreadyDecided("Day-off request"));
    }

    Ok(())
}

#[post("")]
async fn create_day_off(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<CreateDayOff>) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let days = date_off_number(payload.day_off_type, payload.start_date_time, payload.end_date_time)?;
    let now = Local::now().fixed_offset();

    let day_off = DayOffRequest::insert(day_off_request::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        user_id: Set(session.id),
        supervisor_id: Set(payload.supervisor_id),
        employee_id: Set(Some(session.id)),
        day_off_type: Set(payload.day_off_type),
        start_date_time: Set(payload.start_date_time),
        end_date_time: Set(payload.end_date_time),
        date_off_number: Set(days),
        title: Set(payload.title),
        status: Set(DayOffStatus::Pending),
        ..Default::default()
    }).exec_with_returning(db.get_ref()).await?;

    info!(day_off_id = %day_off.id, user_id = %session.id, days, "day-off requested");

    Ok(HttpResponse::Created().json(DayOffResponse {
        message: "Day-off request created successfully".to_string(),
        day_off,
    }))
}

#[get("")]
async fn get_day_offs(db: web::Data<DatabaseConnection>, session: Session, query: web::Query<DayOffQuery>) -> Result<HttpResponse, ApiError> {
    let user_id = match query.user_id {
        Some(user_id) if !session.can_view(user_id) => {
            return Err(ApiError::Forbidden("cannot view another employee's day-off requests"));
        },
        Some(user_id) => Some(user_id),
        None if session.is_approver() => None,
        None => Some(session.id),
    };

    let mut select = DayOffRequest::find();

    if let Some(user_id) = user_id {
        select = select.filter(day_off_request::Column::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        select = select.filter(day_off_request::Column::Status.eq(status));
    }
    if query.month.is_some() || query.year.is_some() {
        let period = Period::resolve(query.month, query.year, Local::now().date_naive())?;
        let (from, to) = match query.month {
            Some(_) => period.window(),
            None => period.year_window(),
        };

        select = select.filter(day_off_request::Column::StartDateTime.between(from, to));
    }

    let day_offs = select
        .order_by_desc(day_off_request::Column::StartDateTime)
        .all(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(DayOffListResponse {
        message: "Day-off requests retrieved successfully".to_string(),
        count: day_offs.len(),
        day_offs,
    }))
}

#[put("/{day_off_id}")]
async fn update_day_off(
    db: web::Data<DatabaseConnection>,
    session: Session,
    day_off: day_off_request::Model,
    payload: web::Json<UpdateDayOff>,
) -> Result<HttpResponse, ApiError> {
    ensure_editable(&session, &day_off)?;

    let payload = payload.into_inner();
    let day_off_type = payload.day_off_type.unwrap_or(day_off.day_off_type);
    let start = payload.start_date_time.unwrap_or(day_off.start_date_time);
    let end = payload.end_date_time.unwrap_or(day_off.end_date_time);

    let day_off = DayOffRequest::update(day_off_request::ActiveModel {
        id: Unchanged(day_off.id),
        updated_at: Set(Local::now().fixed_offset()),
        day_off_type: Set(day_off_type),
        start_date_time: Set(start),
        end_date_time: Set(end),
        date_off_number: Set(date_off_number(day_off_type, start, end)?),
        title: Set(payload.title.unwrap_or(day_off.title)),
        supervisor_id: Set(payload.supervisor_id.or(day_off.supervisor_id)),
        ..Default::default()
    }).exec(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(DayOffResponse {
        message: "Day-off request updated successfully".to_string(),
        day_off,
    }))
}

#[delete("/{day_off_id}")]
async fn delete_day_off(db: web::Data<DatabaseConnection>, session: Session, day_off: day_off_request::Model) -> Result<HttpResponse, ApiError> {
    ensure_editable(&session, &day_off)?;

    DayOffRequest::delete_by_id(day_off.id).exec(db.get_ref()).await?;

    info!(day_off_id = %day_off.id, by = %session.id, "day-off request deleted");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Day-off request deleted successfully".to_string(),
    }))
}

#[put("/{day_off_id}/status")]
async fn update_day_off_status(
    db: web::Data<DatabaseConnection>,
    approver: Approver,
    day_off: day_off_request::Model,
    payload: web::Json<DecideDayOff>,
) -> Result<HttpResponse, ApiError> {
    if payload.status == DayOffStatus::Pending {
        return Err(ApiError::validation("status must be Accepted or Rejected"));
    }

    if !approver.is_admin() && day_off.supervisor_id != Some(approver.id) {
        return Err(ApiError::Forbidden("day-off request is addressed to another supervisor"));
    }

    if day_off.status != DayOffStatus::Pending {
        return Err(ApiError::AlreadyDecided("Day-off request"));
    }

    let day_off = DayOffRequest::update(day_off_request::ActiveModel {
        id: Unchanged(day_off.id),
        updated_at: Set(Local::now().fixed_offset()),
        status: Set(payload.status),
        ..Default::default()
    }).exec(db.get_ref()).await?;

    info!(day_off_id = %day_off.id, status = ?day_off.status, by = %approver.id, "day-off request decided");

    Ok(HttpResponse::Ok().json(DayOffResponse {
        message: "Day-off request status updated successfully".to_string(),
        day_off,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{Method, StatusCode}, test, App};
    use chrono::{TimeZone as _, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    use crate::{
        auth::{tests::{bearer, with_role}, Authority},
        entity::sea_orm_active_enums::RoleType,
        payroll::tests::accepted_day_off,
    };

    use super::*;

    const SECRET: &[u8] = b"secret";

    fn pending(user_id: Uuid, supervisor_id: Option<Uuid>) -> day_off_request::Model {
        day_off_request::Model {
            supervisor_id,
            status: DayOffStatus::Pending,
            ..accepted_day_off(user_id, 3.0)
        }
    }

    macro_rules! app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Authority::new(SECRET)))
                    .app_data(web::Data::new($db.into_connection()))
                    .configure(crate::pages::config)
            ).await
        };
    }

    #[actix_web::test]
    async fn test_create_day_off() {
        let employee = with_role(RoleType::Employee);
        let created = pending(employee.id, None);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ created.clone() ]]);
        let app = app!(db);

        let req = test::TestRequest::default()
            .uri("/api/day-offs")
            .method(Method::POST)
            .insert_header(bearer(SECRET, &employee))
            .set_json(json!({
                "day_off_type": "FULL_DAY",
                "start_date_time": "2025-06-10T00:00:00Z",
                "end_date_time": "2025-06-12T00:00:00Z",
                "title": "family trip"
            }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let req = test::TestRequest::default()
            .uri("/api/day-offs")
            .method(Method::POST)
            .insert_header(bearer(SECRET, &employee))
            .set_json(json!({
                "day_off_type": "HALF_DAY",
                "start_date_time": "2025-06-10T08:00:00Z",
                "end_date_time": "2025-06-11T12:00:00Z"
            }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_update_rederives_days() {
        let employee = with_role(RoleType::Employee);
        let day_off = pending(employee.id, None);

        let updated = day_off_request::Model {
            day_off_type: DayOffType::HalfDay,
            date_off_number: 0.5,
            ..day_off.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ day_off.clone() ]])
            .append_query_results([vec![ updated.clone() ]]);
        let app = app!(db);

        let req = test::TestRequest::default()
            .uri(&format!("/api/day-offs/{}", day_off.id))
            .method(Method::PUT)
            .insert_header(bearer(SECRET, &employee))
            .set_json(json!({
                "day_off_type": "HALF_DAY",
                "start_date_time": "2025-06-10T08:00:00Z",
                "end_date_time": "2025-06-10T12:00:00Z"
            }))
            .to_request();

        let body: DayOffResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.day_off, updated);
    }

    #[actix_web::test]
    async fn test_decided_day_off_is_frozen() {
        let employee = with_role(RoleType::Employee);
        let stranger = with_role(RoleType::Employee);
        let accepted = accepted_day_off(employee.id, 2.0);
        let open = pending(employee.id, None);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ accepted.clone() ],
                vec![ accepted.clone() ],
                vec![ open.clone() ],
            ]);
        let app = app!(db);

        let req = test::TestRequest::default()
            .uri(&format!("/api/day-offs/{}", accepted.id))
            .method(Method::PUT)
            .insert_header(bearer(SECRET, &employee))
            .set_json(json!({ "title": "changed" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::default()
            .uri(&format!("/api/day-offs/{}", accepted.id))
            .method(Method::DELETE)
            .insert_header(bearer(SECRET, &employee))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::default()
            .uri(&format!("/api/day-offs/{}", open.id))
            .method(Method::DELETE)
            .insert_header(bearer(SECRET, &stranger))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_delete_pending_day_off() {
        let employee = with_role(RoleType::Employee);
        let day_off = pending(employee.id, None);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ day_off.clone() ]])
            .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }]);
        let app = app!(db);

        let req = test::TestRequest::default()
            .uri(&format!("/api/day-offs/{}", day_off.id))
            .method(Method::DELETE)
            .insert_header(bearer(SECRET, &employee))
            .to_request();

        let body: MessageResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.message, "Day-off request deleted successfully");
    }

    #[actix_web::test]
    async fn test_decide_day_off() {
        let supervisor = with_role(RoleType::Supervisor);
        let day_off = pending(Uuid::new_v4(), Some(supervisor.id));
        let accepted = day_off_request::Model { status: DayOffStatus::Accepted, ..day_off.clone() };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ day_off.clone() ],
                vec![ day_off.clone() ],
                vec![ accepted.clone() ],
                vec![ accepted.clone() ],
            ]);
        let app = app!(db);

        let decide = |status: &str| test::TestRequest::default()
            .uri(&format!("/api/day-offs/{}/status", day_off.id))
            .method(Method::PUT)
            .insert_header(bearer(SECRET, &supervisor))
            .set_json(json!({ "status": status }))
            .to_request();

        let response = test::call_service(&app, decide("Pending")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: DayOffResponse = test::call_and_read_body_json(&app, decide("Accepted")).await;
        assert_eq!(body.day_off.status, DayOffStatus::Accepted);

        let response = test::call_service(&app, decide("Rejected")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_get_day_offs_filters_by_owner() {
        let employee = with_role(RoleType::Employee);
        let own = day_off_request::Model {
            start_date_time: Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap().fixed_offset(),
            ..pending(employee.id, None)
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ own.clone() ]]);
        let app = app!(db);

        let req = test::TestRequest::default()
            .uri("/api/day-offs?status=Pending&month=6&year=2025")
            .insert_header(bearer(SECRET, &employee))
            .to_request();

        let body: DayOffListResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.count, 1);
        assert_eq!(body.day_offs, vec![own]);
    }
}
