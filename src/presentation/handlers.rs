use crate::application::auth_service::{ACCESS_DENIED, AuthService};
use crate::application::course_service::{COURSE_NOT_FOUND, CourseService};
use crate::domain::error::DomainError;
use crate::domain::repository::{CourseRepository, UserRepository};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use std::future::{Ready, ready};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const UNEXPECTED_ERROR: &str = "Sorry! There was an unexpected error on the server.";

pub struct AppState {
    pub auth_service: AuthService,
    pub course_service: CourseService,
}

impl AppState {
    pub fn new(users: Arc<dyn UserRepository>, courses: Arc<dyn CourseRepository>) -> Self {
        Self {
            auth_service: AuthService::new(users),
            course_service: CourseService::new(courses),
        }
    }
}

#[derive(Serialize)]
struct MessageResponse<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct ValidationResponse<'a> {
    errors: &'a [String],
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(ACCESS_DENIED.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut builder = HttpResponse::build(status);

        match self {
            ApiError::Validation(errors) => {
                warn!(?errors, status = %status, "Validation error");
                builder.json(ValidationResponse { errors })
            }
            ApiError::NotFound(msg) => {
                warn!(error = %msg, status = %status, "Resource not found");
                builder.json(MessageResponse { message: msg })
            }
            ApiError::Unauthorized(msg) | ApiError::Forbidden(msg) => {
                warn!(error = %msg, status = %status, "Access refused");
                builder.json(MessageResponse { message: msg })
            }
            // The cause stays in the logs; clients get a fixed message.
            ApiError::Internal(msg) => {
                error!(error = %msg, status = %status, "Internal error");
                builder.json(MessageResponse {
                    message: UNEXPECTED_ERROR,
                })
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(errors)) => ApiError::Validation(errors.clone()),
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg.clone()),
            Some(DomainError::Forbidden(msg)) => ApiError::Forbidden(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        ready(user.ok_or_else(|| {
            warn!(path = %req.path(), "Route reached without basic-auth guard");
            ApiError::unauthorized()
        }))
    }
}

/// Rejects unparsable JSON bodies with the same shape as validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(vec![err.to_string()]).into())
}

/// Path ids are numeric; anything else cannot name a course.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| ApiError::NotFound(COURSE_NOT_FOUND.to_string()).into())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

pub async fn welcome() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: "Welcome to the REST API project!",
    })
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    warn!(method = %req.method(), path = %req.path(), "Route not found");
    HttpResponse::NotFound().json(MessageResponse {
        message: "Route Not Found",
    })
}
