use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::entity::sea_orm_active_enums::SalaryStatus;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Salary is already {0}, cannot modify")]
    Locked(SalaryStatus),
    #[error("Salary cannot move from {from} to {to}")]
    InvalidTransition { from: SalaryStatus, to: SalaryStatus },
    #[error("{0} has already been decided")]
    AlreadyDecided(&'static str),
    #[error("Salary for this employee and period already exists")]
    Duplicate,
    #[error("database error")]
    Store(#[from] DbErr),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Maps an insert failure, recognizing the unique index guarding a key
    pub fn from_insert(err: DbErr) -> Self {
        let violation = err.sql_err();
        Self::from_violation(violation, err)
    }

    fn from_violation(violation: Option<SqlErr>, err: DbErr) -> Self {
        match violation {
            Some(SqlErr::UniqueConstraintViolation(_)) => ApiError::Duplicate,
            _ => ApiError::Store(err),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Locked(_)
            | ApiError::InvalidTransition { .. }
            | ApiError::AlreadyDecided(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Duplicate => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Store(err) => {
                error!(error = %err, "database operation failed");
                "Internal server error".to_string()
            },
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody { message })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::MessageBody as _;

    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::validation("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("User").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Locked(SalaryStatus::Approved).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Duplicate.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Store(DbErr::Custom("boom".into())).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_locked_message_names_status() {
        assert_eq!(
            ApiError::Locked(SalaryStatus::Paid).to_string(),
            "Salary is already paid, cannot modify"
        );
    }

    #[test]
    fn test_store_error_is_redacted() {
        let response = ApiError::Store(DbErr::Custom("connection refused on 10.0.0.3".into())).error_response();
        let body = response.into_body().try_into_bytes().unwrap();

        assert_eq!(&body[..], br#"{"message":"Internal server error"}"#);
    }

    #[test]
    fn test_non_sql_insert_error_stays_store() {
        assert!(matches!(ApiError::from_insert(DbErr::Custom("x".into())), ApiError::Store(_)));
    }

    #[test]
    fn test_losing_insert_is_conflict() {
        let violation = SqlErr::UniqueConstraintViolation(
            r#"duplicate key value violates unique constraint "idx_salary_period""#.to_string()
        );
        let err = ApiError::from_violation(Some(violation), DbErr::Custom("insert failed".into()));
        assert!(matches!(err, ApiError::Duplicate));

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = response.into_body().try_into_bytes().unwrap();
        assert_eq!(&body[..], br#"{"message":"Salary for this employee and period already exists"}"#);
    }

    #[test]
    fn test_foreign_key_violation_stays_store() {
        let violation = SqlErr::ForeignKeyConstraintViolation("salary_user_id_fkey".to_string());
        let err = ApiError::from_violation(Some(violation), DbErr::Custom("insert failed".into()));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
