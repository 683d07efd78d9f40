use std::ops::Deref;

use actix_web::{body, dev, http::{self, StatusCode}, web, FromRequest, HttpRequest, HttpResponse};
use chrono::{Duration, Local};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{consts::TOKEN_LIFETIME_WEEKS, entity::{sea_orm_active_enums::RoleType, user}, error::ApiError};

/// Signs and verifies session tokens
pub struct Authority {
    jwt_key: (EncodingKey, DecodingKey),
}

/// Who is calling. The only thing a token carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub role: RoleType,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == RoleType::Admin
    }

    pub fn is_approver(&self) -> bool {
        matches!(self.role, RoleType::Admin | RoleType::Supervisor)
    }

    /// Admins and supervisors may look at anyone, employees only at themselves
    pub fn can_view(&self, user_id: Uuid) -> bool {
        self.id == user_id || self.is_approver()
    }
}

impl From<&user::Model> for Session {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

impl Authority {
    pub fn new(jwt_key: &[u8]) -> Self {
        Self {
            jwt_key: (EncodingKey::from_secret(jwt_key), DecodingKey::from_secret(jwt_key))
        }
    }

    /// Issue a token for specified user
    pub fn issue_for(&self, user: &user::Model) -> Result<String, AuthError> {
        let claims = Claims {
            exp: (Local::now() + Duration::weeks(TOKEN_LIFETIME_WEEKS)).timestamp(),
            data: Session::from(user),
        };

        Ok(encode(&Header::default(), &claims, &self.jwt_key.0)?)
    }

    pub fn authorize(&self, token: impl AsRef<str>) -> Result<Session, AuthError> {
        let payload = decode::<Claims<Session>>(token.as_ref(), &self.jwt_key.1, &Validation::default())?;

        Ok(payload.claims.data)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims<T> {
    exp: i64,
    data: T,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authority error")]
    AuthorityError(#[from] jsonwebtoken::errors::Error),
}

impl actix_web::error::ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "message": self.to_string() }))
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            AuthError::AuthorityError(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // Grabs the value after the space in `Authorization`
            // Example: JWT sometoken
            //              ^ grabs this value
            let Some(Ok(Some((_, token)))) = req.headers()
                .get("Authorization")
                .map(|v|
                    v.to_str()
                        .map(|str| str.split_once(" "))
                )
            else {
                return Err(actix_web::error::ErrorUnauthorized("unauthorized"))
            };

            let Some(authority) = req.app_data::<web::Data<Authority>>() else {
                return Err(actix_web::error::ErrorInternalServerError("authority is not configured"))
            };

            Ok(authority.authorize(token)?)
        })
    }
}

macro_rules! role_guard {
    ($(#[$doc:meta])* $name:ident, $check:ident, $reason:literal) => {
        $(#[$doc])*
        pub struct $name(pub Session);

        impl Deref for $name {
            type Target = Session;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
                let req = req.clone();

                Box::pin(async move {
                    let session = Session::from_request(&req, &mut dev::Payload::None).await?;

                    if !session.$check() {
                        return Err(ApiError::Forbidden($reason).into())
                    }

                    Ok(Self(session))
                })
            }
        }
    };
}

role_guard!(
    /// Admin only
    Admin, is_admin, "admin role required"
);

role_guard!(
    /// Admin or supervisor
    Approver, is_approver, "supervisor or admin role required"
);

#[cfg(test)]
pub(crate) mod tests {
    use actix_web::{body::MessageBody, get, test, web, App, Responder};

    use crate::payroll::tests::employee;

    use super::*;

    pub(crate) fn with_role(role: RoleType) -> user::Model {
        user::Model { role, ..employee(1_000_000, 12.0) }
    }

    pub(crate) fn bearer(secret: &[u8], user: &user::Model) -> (&'static str, String) {
        let token = Authority::new(secret).issue_for(user).unwrap();

        ("Authorization", format!("JWT {token}"))
    }

    #[actix_web::test]
    async fn test_authority() {
        let authority = Authority::new(b"secret");

        let user = with_role(RoleType::Employee);

        let token = authority.issue_for(&user).unwrap();

        let session = authority.authorize(token).expect("Unable to authorize user from token");
        assert_eq!(session, Session::from(&user));
        assert!(Authority::new(b"other").authorize(authority.issue_for(&user).unwrap()).is_err());
    }

    #[actix_web::test]
    async fn test_session_visibility() {
        let employee = Session::from(&with_role(RoleType::Employee));
        let supervisor = Session::from(&with_role(RoleType::Supervisor));
        let other = Uuid::new_v4();

        assert!(employee.can_view(employee.id));
        assert!(!employee.can_view(other));
        assert!(supervisor.can_view(other));
        assert!(!supervisor.is_admin());
    }

    #[actix_web::test]
    async fn test_extractor() {
        let secret = b"secret";

        #[get("/")]
        async fn test_handler(session: Session) -> impl Responder {
            session.id.to_string()
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .service(test_handler)
        ).await;

        {
            let forbidden_req = test::TestRequest::default()
                .uri("/")
                .insert_header(("Authorization", "JWT wrong"))
                .to_request();

            let response = test::call_service(&app, forbidden_req).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        {
            let unauthorized_req = test::TestRequest::default()
                .uri("/")
                .to_request();

            let response = test::call_service(&app, unauthorized_req).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        {
            let user = with_role(RoleType::Employee);

            let authorized_req = test::TestRequest::default()
                .insert_header(bearer(secret, &user))
                .to_request();

            let response = test::call_service(&app, authorized_req).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.into_body().try_into_bytes().unwrap(), user.id.to_string().as_bytes());
        }
    }

    #[actix_web::test]
    async fn test_role_extractors() {
        let secret = b"secret";

        #[get("/admin")]
        async fn admin_handler(admin: Admin) -> impl Responder {
            assert!(admin.is_admin());

            ""
        }

        #[get("/approver")]
        async fn approver_handler(approver: Approver) -> impl Responder {
            assert!(approver.is_approver());

            ""
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .service(admin_handler)
                .service(approver_handler)
        ).await;

        let cases = [
            ("/admin", RoleType::Admin, StatusCode::OK),
            ("/admin", RoleType::Supervisor, StatusCode::FORBIDDEN),
            ("/admin", RoleType::Employee, StatusCode::FORBIDDEN),
            ("/approver", RoleType::Admin, StatusCode::OK),
            ("/approver", RoleType::Supervisor, StatusCode::OK),
            ("/approver", RoleType::Employee, StatusCode::FORBIDDEN),
        ];

        for (uri, role, expected) in cases {
            let req = test::TestRequest::default()
                .uri(uri)
                .insert_header(bearer(secret, &with_role(role)))
                .to_request();

            let response = test::call_service(&app, req).await;
            assert_eq!(response.status(), expected, "{uri} as {role:?}");
        }
    }
}
