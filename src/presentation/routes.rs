use crate::presentation::courses::{
    create_course, delete_course, get_course, list_courses, update_course,
};
use crate::presentation::handlers::{health_check, json_config, path_config, welcome};
use crate::presentation::middleware::BasicAuthMiddleware;
use crate::presentation::users::{current_user, register};
use actix_web::web;

/// Registers every endpoint. Mutating routes and `GET /api/users` sit behind
/// [`BasicAuthMiddleware`]; the rest are public.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .route("/", web::get().to(welcome))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_check))
                .service(
                    web::resource("/users")
                        .route(web::get().to(current_user).wrap(BasicAuthMiddleware))
                        .route(web::post().to(register)),
                )
                .service(
                    web::resource("/courses")
                        .route(web::get().to(list_courses))
                        .route(web::post().to(create_course).wrap(BasicAuthMiddleware)),
                )
                .service(
                    web::resource("/courses/{id}")
                        .route(web::get().to(get_course))
                        .route(web::put().to(update_course).wrap(BasicAuthMiddleware))
                        .route(web::delete().to(delete_course).wrap(BasicAuthMiddleware)),
                ),
        );
}
