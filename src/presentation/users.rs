use crate::domain::user::{CreateUser, UserSummary};
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, http::header, web};
use tracing::{info, instrument};

/// `GET /users`: the account behind the supplied credentials.
#[instrument(skip(state, user), fields(user_id = user.id()))]
pub async fn current_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let user = state.auth_service.current_user(user.id()).await?;
    Ok(HttpResponse::Ok().json(UserSummary::from(&user)))
}

/// `POST /users`: registration. Responds with an empty body and `Location: /`.
#[instrument(skip(state, req))]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    info!(email = %req.email(), "Registration request received");

    let user = state.auth_service.register_user(req.into_inner()).await?;

    info!(user_id = user.id, "User registered");
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, "/"))
        .finish())
}
