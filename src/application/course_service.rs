use crate::domain::course::{Course, CourseInput, CourseWithOwner};
use crate::domain::error::DomainError;
use crate::domain::repository::CourseRepository;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const COURSE_NOT_FOUND: &str = "Course not found";
pub const NOT_COURSE_OWNER: &str = "Access denied.";

pub struct CourseService {
    repository: Arc<dyn CourseRepository>,
}

impl CourseService {
    pub fn new(repository: Arc<dyn CourseRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_courses(&self) -> Result<Vec<CourseWithOwner>> {
        self.repository.list_courses().await
    }

    pub async fn get_course(&self, id: i64) -> Result<CourseWithOwner> {
        self.repository
            .find_course_with_owner(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(COURSE_NOT_FOUND.to_string()).into())
    }

    #[instrument(skip(self, input))]
    pub async fn create_course(&self, owner_id: i64, input: CourseInput) -> Result<Course> {
        let fields = input.into_fields().map_err(DomainError::Validation)?;
        let course = self.repository.create_course(owner_id, fields).await?;
        info!(course_id = course.id, "Course created");
        Ok(course)
    }

    /// Loads a course the caller intends to modify, enforcing ownership.
    async fn owned_course(&self, owner_id: i64, id: i64) -> Result<Course> {
        let course = self
            .repository
            .find_course(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(COURSE_NOT_FOUND.to_string()))?;
        if course.user_id != owner_id {
            warn!(course_id = id, owner_id = course.user_id, "Caller does not own course");
            return Err(DomainError::Forbidden(NOT_COURSE_OWNER.to_string()).into());
        }
        Ok(course)
    }

    /// Body validation runs before the lookup, so a bad payload is a 400 even
    /// for a course that does not exist.
    #[instrument(skip(self, input))]
    pub async fn update_course(&self, owner_id: i64, id: i64, input: CourseInput) -> Result<Course> {
        let fields = input.into_fields().map_err(DomainError::Validation)?;
        self.owned_course(owner_id, id).await?;
        let course = self
            .repository
            .update_course(id, fields)
            .await?
            .ok_or_else(|| DomainError::NotFound(COURSE_NOT_FOUND.to_string()))?;
        info!(course_id = id, "Course updated");
        Ok(course)
    }

    #[instrument(skip(self))]
    pub async fn delete_course(&self, owner_id: i64, id: i64) -> Result<()> {
        self.owned_course(owner_id, id).await?;
        if !self.repository.delete_course(id).await? {
            return Err(DomainError::NotFound(COURSE_NOT_FOUND.to_string()).into());
        }
        info!(course_id = id, "Course deleted");
        Ok(())
    }
}
