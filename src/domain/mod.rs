pub mod course;
pub mod error;
pub mod repository;
pub mod user;
