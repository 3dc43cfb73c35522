use crate::domain::course::{Course, CourseFields, CourseWithOwner};
use crate::domain::user::{NewUser, User};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DomainError::Validation` when the email is already taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<CourseWithOwner>>;
    async fn find_course(&self, id: i64) -> Result<Option<Course>>;
    async fn find_course_with_owner(&self, id: i64) -> Result<Option<CourseWithOwner>>;
    async fn create_course(&self, user_id: i64, fields: CourseFields) -> Result<Course>;
    /// Returns `None` when the course vanished in the meantime.
    async fn update_course(&self, id: i64, fields: CourseFields) -> Result<Option<Course>>;
    /// Returns whether a row was removed.
    async fn delete_course(&self, id: i64) -> Result<bool>;
}
