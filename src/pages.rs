use std::str::FromStr as _;

use actix_web::web;
use uuid::Uuid;

use crate::error::ApiError;

mod auth;
mod day_off;
mod request;
mod salary;
mod user;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .app_data(web::JsonConfig::default()
            .error_handler(|err, _| ApiError::validation(err.to_string()).into()))
        .app_data(web::QueryConfig::default()
            .error_handler(|err, _| ApiError::validation(err.to_string()).into()))
        .service(web::scope("/api")
            .service(web::scope("/auth")
                .configure(auth::config))
            .service(web::scope("/salaries")
                .configure(salary::config))
            .service(web::scope("/requests")
                .configure(request::config))
            .service(web::scope("/day-offs")
                .configure(day_off::config))
            .service(web::scope("/users")
                .configure(user::config)));
}

/// Parses an id taken from the path, so a malformed id is a 400 rather than a 404
pub(crate) fn parse_id(raw: &str, name: &'static str) -> Result<Uuid, ApiError> {
    Uuid::from_str(raw).map_err(|_| ApiError::validation(format!("invalid `{name}`")))
}
