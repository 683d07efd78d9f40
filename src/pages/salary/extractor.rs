use std::ops::Deref;

use actix_web::{dev, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::pages::parse_id;

use super::*;

impl FromRequest for salary::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let Some(salary_id) = req.match_info().get("salary_id") else {
                return Err(actix_web::error::ErrorInternalServerError("salary extractor used outside a `salary_id` path"))
            };
            let salary_id = parse_id(salary_id, "salary_id")?;

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not configured"))
            };

            let Some(salary) = Salary::find_by_id(salary_id)
                .one(db.get_ref()).await.map_err(ApiError::from)?
            else {
                return Err(ApiError::NotFound("Salary").into())
            };

            Ok(salary)
        })
    }
}

/// A salary that can still be recalculated, edited or deleted
pub(super) struct PendingSalary(pub(super) salary::Model);

impl Deref for PendingSalary {
    type Target = salary::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for PendingSalary {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let salary = salary::Model::from_request(&req, &mut dev::Payload::None).await?;

            if !salary.status.is_editable() {
                return Err(ApiError::Locked(salary.status).into());
            }

            Ok(Self(salary))
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{get, http::StatusCode, test, App, Responder};
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::{pages::salary::tests::pending_salary, payroll::tests::employee};

    use super::*;

    #[actix_web::test]
    async fn test_salary_extractor() {
        #[get("/{salary_id}")]
        async fn test_handler(salary: salary::Model) -> impl Responder {
            web::Json(salary)
        }

        let salary = pending_salary(&employee(1_000_000, 12.0));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ salary.clone() ],
                vec![ ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db.into_connection()))
                .service(test_handler)
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/{}", salary.id))
            .to_request();

        let returned_salary: salary::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned_salary, salary);

        let missing_req = test::TestRequest::default()
            .uri(&format!("/{}", Uuid::new_v4()))
            .to_request();

        let response = test::call_service(&app, missing_req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let malformed_req = test::TestRequest::default()
            .uri("/not-a-uuid")
            .to_request();

        let response = test::call_service(&app, malformed_req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_pending_salary_extractor() {
        #[get("/{salary_id}")]
        async fn test_handler(salary: PendingSalary) -> impl Responder {
            web::Json(salary.0)
        }

        let user = employee(1_000_000, 12.0);
        let pending = pending_salary(&user);
        let approved = salary::Model { status: SalaryStatus::Approved, ..pending_salary(&user) };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ pending.clone() ],
                vec![ approved.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db.into_connection()))
                .service(test_handler)
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/{}", pending.id))
            .to_request();

        let returned_salary: salary::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned_salary, pending);

        let req = test::TestRequest::default()
            .uri(&format!("/{}", approved.id))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
