pub mod courses;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod users;
