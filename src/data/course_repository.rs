use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::course::{Course, CourseFields, CourseWithOwner};
use crate::domain::error::DomainError;
use crate::domain::repository::{CourseRepository, UserRepository};
use crate::domain::user::UserSummary;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Courses kept in a map ordered by id. Owner data is read from the user
/// repository it was built with, the way a join would.
#[derive(Clone)]
pub struct InMemoryCourseRepository {
    users: InMemoryUserRepository,
    storage: Arc<RwLock<BTreeMap<i64, Course>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryCourseRepository {
    pub fn new(users: InMemoryUserRepository) -> Self {
        Self {
            users,
            storage: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    async fn with_owner(&self, course: Course) -> Result<CourseWithOwner> {
        let owner = self
            .users
            .find_user_by_id(course.user_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(format!(
                    "course {} references missing user {}",
                    course.id, course.user_id
                ))
            })?;
        Ok(CourseWithOwner::new(course, UserSummary::from(&owner)))
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    #[instrument(skip(self))]
    async fn list_courses(&self) -> Result<Vec<CourseWithOwner>> {
        let courses: Vec<Course> = self.storage.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(courses.len());
        for course in courses {
            out.push(self.with_owner(course).await?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    async fn find_course(&self, id: i64) -> Result<Option<Course>> {
        Ok(self.storage.read().await.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_course_with_owner(&self, id: i64) -> Result<Option<CourseWithOwner>> {
        match self.find_course(id).await? {
            Some(course) => Ok(Some(self.with_owner(course).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, fields))]
    async fn create_course(&self, user_id: i64, fields: CourseFields) -> Result<Course> {
        if self.users.find_user_by_id(user_id).await?.is_none() {
            return Err(DomainError::Internal(format!("owner {} does not exist", user_id)).into());
        }

        let now = Utc::now();
        let course = Course {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: fields.title,
            description: fields.description,
            estimated_time: fields.estimated_time.flatten(),
            materials_needed: fields.materials_needed.flatten(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        self.storage.write().await.insert(course.id, course.clone());
        debug!(course_id = course.id, user_id, "Course saved to memory storage");
        Ok(course)
    }

    #[instrument(skip(self, fields))]
    async fn update_course(&self, id: i64, fields: CourseFields) -> Result<Option<Course>> {
        let mut storage = self.storage.write().await;
        let Some(course) = storage.get_mut(&id) else {
            return Ok(None);
        };
        course.title = fields.title;
        course.description = fields.description;
        if let Some(estimated_time) = fields.estimated_time {
            course.estimated_time = estimated_time;
        }
        if let Some(materials_needed) = fields.materials_needed {
            course.materials_needed = materials_needed;
        }
        course.updated_at = Utc::now();
        Ok(Some(course.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_course(&self, id: i64) -> Result<bool> {
        Ok(self.storage.write().await.remove(&id).is_some())
    }
}
