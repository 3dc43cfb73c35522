pub mod course_repository;
pub mod postgres;
pub mod user_repository;
