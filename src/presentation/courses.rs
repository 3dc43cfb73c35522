use crate::domain::course::CourseInput;
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, http::header, web};
use tracing::{info, instrument};

#[instrument(skip(state))]
pub async fn list_courses(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let courses = state.course_service.list_courses().await?;
    info!(count = courses.len(), "Courses listed");
    Ok(HttpResponse::Ok().json(courses))
}

#[instrument(skip(state), fields(course_id = %*path))]
pub async fn get_course(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let course = state.course_service.get_course(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(course))
}

#[instrument(skip(state, user, req), fields(user_id = user.id()))]
pub async fn create_course(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CourseInput>,
) -> Result<HttpResponse, ApiError> {
    let course = state
        .course_service
        .create_course(user.id(), req.into_inner())
        .await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/courses/{}", course.id)))
        .finish())
}

#[instrument(skip(state, user, req), fields(user_id = user.id(), course_id = %*path))]
pub async fn update_course(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<CourseInput>,
) -> Result<HttpResponse, ApiError> {
    state
        .course_service
        .update_course(user.id(), path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip(state, user), fields(user_id = user.id(), course_id = %*path))]
pub async fn delete_course(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    state
        .course_service
        .delete_course(user.id(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
