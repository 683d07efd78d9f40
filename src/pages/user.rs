use actix_web::{get, post, web, HttpResponse};
use chrono::Local;
use sea_orm::{ActiveValue::{Set, Unchanged}, DatabaseConnection, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{Admin, Session},
    entity::{prelude::*, user, vacation_adjustment},
    error::ApiError,
    pages::parse_id,
    payroll::{self, Period, VacationSummary},
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(get_vacation)
        .service(adjust_vacation);
}

#[derive(Debug, Deserialize)]
struct PeriodQuery {
    month: Option<u32>,
    year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AdjustVacation {
    days: f64,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Serialize)]
struct VacationData {
    user_id: Uuid,
    month: u32,
    year: i32,
    #[serde(flatten)]
    vacation: VacationSummary,
}

#[derive(Debug, Serialize)]
struct VacationResponse {
    message: String,
    data: VacationData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AdjustmentResponse {
    message: String,
    adjustment: vacation_adjustment::Model,
    vacation_days: f64,
}

#[get("/{user_id}/vacation")]
async fn get_vacation(
    db: web::Data<DatabaseConnection>,
    session: Session,
    user_id: web::Path<String>,
    query: web::Query<PeriodQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    if !session.can_view(user_id) {
        return Err(ApiError::Forbidden("cannot view another employee's vacation"));
    }

    let period = Period::resolve(query.month, query.year, Local::now().date_naive())?;

    let Some(user) = User::find_by_id(user_id).one(db.get_ref()).await? else {
        return Err(ApiError::NotFound("User"));
    };

    let mut warnings = Vec::new();
    let vacation = payroll::vacation_balance(db.get_ref(), &user, period, &mut warnings).await;

    Ok(HttpResponse::Ok().json(VacationResponse {
        message: "Vacation summary retrieved successfully".to_string(),
        data: VacationData {
            user_id,
            month: period.month,
            year: period.year,
            vacation,
        },
        warnings,
    }))
}

/// Deducts days from the balance, which may go negative, and records who did it
#[post("/{user_id}/vacation-adjustments")]
async fn adjust_vacation(
    db: web::Data<DatabaseConnection>,
    admin: Admin,
    user_id: web::Path<String>,
    payload: web::Json<AdjustVacation>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;

    if !payload.days.is_finite() || payload.days <= 0.0 {
        return Err(ApiError::validation("days must be a positive number"));
    }

    let txn = db.begin().await?;

    let Some(user) = User::find_by_id(user_id).one(&txn).await? else {
        return Err(ApiError::NotFound("User"));
    };

    let previous_balance = user.vacation_days;
    let new_balance = previous_balance - payload.days;
    let now = Local::now().fixed_offset();

    User::update(user::ActiveModel {
        id: Unchanged(user.id),
        updated_at: Set(now),
        vacation_days: Set(new_balance),
        ..Default::default()
    }).exec(&txn).await?;

    let adjustment = VacationAdjustment::insert(vacation_adjustment::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(Some(admin.id)),
        user_id: Set(user.id),
        days: Set(payload.days),
        previous_balance: Set(previous_balance),
        new_balance: Set(new_balance),
        reason: Set(payload.into_inner().reason),
        ..Default::default()
    }).exec_with_returning(&txn).await?;

    txn.commit().await?;

    info!(user_id = %user.id, previous_balance, new_balance, by = %admin.id, "vacation balance adjusted");

    Ok(HttpResponse::Created().json(AdjustmentResponse {
        message: "Vacation adjusted successfully".to_string(),
        adjustment,
        vacation_days: new_balance,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{Method, StatusCode}, test, App};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::{json, Value};

    use crate::{
        auth::{tests::{bearer, with_role}, Authority},
        entity::{day_off_request, sea_orm_active_enums::RoleType},
        payroll::tests::{accepted_day_off, employee},
    };

    use super::*;

    const SECRET: &[u8] = b"secret";

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
    async fn test_get_vacation() {
        let user = employee(1_000_000, 6.0);
        let stranger = with_role(RoleType::Employee);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ user.clone() ]])
            .append_query_results([vec![ accepted_day_off(user.id, 1.5) ]])
            .append_query_results([vec![ accepted_day_off(user.id, 1.5), accepted_day_off(user.id, 2.0) ]]);
        let app = app!(db);

        let req = test::TestRequest::default()
            .uri(&format!("/api/users/{}/vacation?month=6&year=2025", user.id))
            .insert_header(bearer(SECRET, &user))
            .to_request();

        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["day_off_days"], json!(1.5));
        assert_eq!(body["data"]["used_vacation_days_this_year"], json!(3.5));
        assert_eq!(body["data"]["remaining_vacation_days"], json!(4.5));
        assert_eq!(body["data"]["signal"], json!("yellow"));

        let req = test::TestRequest::default()
            .uri(&format!("/api/users/{}/vacation", user.id))
            .insert_header(bearer(SECRET, &stranger))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_get_vacation_degrades_on_ledger_failure() {
        let user = employee(1_000_000, 6.0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ user.clone() ]])
            .append_query_results([Vec::<day_off_request::Model>::new()])
            .append_query_errors([sea_orm::DbErr::Custom("timeout".to_string())]);
        let app = app!(db);

        let req = test::TestRequest::default()
            .uri(&format!("/api/users/{}/vacation?month=6&year=2025", user.id))
            .insert_header(bearer(SECRET, &user))
            .to_request();

        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["remaining_vacation_days"], json!(6.0));
        assert_eq!(body["warnings"].as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn test_adjust_vacation_may_go_negative() {
        let admin = with_role(RoleType::Admin);
        let user = employee(1_000_000, 1.0);

        let adjustment = vacation_adjustment::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            created_by: Some(admin.id),
            user_id: user.id,
            days: 2.5,
            previous_balance: 1.0,
            new_balance: -1.5,
            reason: "unpaid leave".to_string(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ user.clone() ]])
            .append_query_results([vec![ user::Model { vacation_days: -1.5, ..user.clone() } ]])
            .append_query_results([vec![ adjustment.clone() ]]);
        let app = app!(db);

        let req = test::TestRequest::default()
            .uri(&format!("/api/users/{}/vacation-adjustments", user.id))
            .method(Method::POST)
            .insert_header(bearer(SECRET, &admin))
            .set_json(json!({ "days": 2.5, "reason": "unpaid leave" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: AdjustmentResponse = test::read_body_json(response).await;
        assert_eq!(body.vacation_days, -1.5);
        assert_eq!(body.adjustment, adjustment);
    }

    #[actix_web::test]
    async fn test_adjust_vacation_validates() {
        let admin = with_role(RoleType::Admin);
        let supervisor = with_role(RoleType::Supervisor);
        let app = app!(MockDatabase::new(DatabaseBackend::Postgres));

        let req = test::TestRequest::default()
            .uri(&format!("/api/users/{}/vacation-adjustments", Uuid::new_v4()))
            .method(Method::POST)
            .insert_header(bearer(SECRET, &admin))
            .set_json(json!({ "days": -1 }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::default()
            .uri(&format!("/api/users/{}/vacation-adjustments", Uuid::new_v4()))
            .method(Method::POST)
            .insert_header(bearer(SECRET, &supervisor))
            .set_json(json!({ "days": 1 }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
