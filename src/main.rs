use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::from_fn, web};
use course_catalog_api::data::course_repository::InMemoryCourseRepository;
use course_catalog_api::data::postgres::{self, PgCourseRepository, PgUserRepository};
use course_catalog_api::data::user_repository::InMemoryUserRepository;
use course_catalog_api::domain::repository::{CourseRepository, UserRepository};
use course_catalog_api::infrastructure::config::AppConfig;
use course_catalog_api::infrastructure::logging::init_logging;
use course_catalog_api::presentation::handlers::{AppState, not_found};
use course_catalog_api::presentation::middleware::track_request;
use course_catalog_api::presentation::routes;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    info!(host = %config.host, port = config.port, "Configuration loaded");

    let (users, courses): (Arc<dyn UserRepository>, Arc<dyn CourseRepository>) =
        match &config.database_url {
            Some(url) => {
                let pool = postgres::connect(url, config.max_connections).await?;
                (
                    Arc::new(PgUserRepository::new(pool.clone())),
                    Arc::new(PgCourseRepository::new(pool)),
                )
            }
            None => {
                warn!("DATABASE_URL not set; data will be kept in memory only");
                let users = InMemoryUserRepository::new();
                (
                    Arc::new(users.clone()),
                    Arc::new(InMemoryCourseRepository::new(users)),
                )
            }
        };

    let state = web::Data::new(AppState::new(users, courses));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .wrap(from_fn(track_request))
            .configure(routes::configure)
            .default_service(web::to(not_found))
    })
    .bind(config.bind_addr())?;

    info!(
        host = %config.host,
        port = config.port,
        routes = %"GET /, GET /api/health, GET|POST /api/users, GET|POST /api/courses, GET|PUT|DELETE /api/courses/{id}",
        "Starting HTTP server"
    );
    server.run().await?;
    Ok(())
}
