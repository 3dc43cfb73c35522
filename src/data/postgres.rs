use crate::domain::course::{Course, CourseFields, CourseWithOwner};
use crate::domain::error::DomainError;
use crate::domain::repository::{CourseRepository, UserRepository};
use crate::domain::user::{EMAIL_IN_USE, NewUser, User, UserSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions};
use tracing::{debug, info, instrument};

/// Connects the pool and applies the embedded migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("run database migrations")?;
    info!(max_connections, "Database pool ready");
    Ok(pool)
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email_address: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            email_address: r.email_address,
            password_hash: r.password_hash,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CourseRow {
    id: i64,
    title: String,
    description: String,
    estimated_time: Option<String>,
    materials_needed: Option<String>,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(r: CourseRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            estimated_time: r.estimated_time,
            materials_needed: r.materials_needed,
            user_id: r.user_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// One row of the courses/users join.
#[derive(Debug, FromRow)]
struct CourseOwnerRow {
    id: i64,
    title: String,
    description: String,
    estimated_time: Option<String>,
    materials_needed: Option<String>,
    user_id: i64,
    owner_first_name: String,
    owner_last_name: String,
    owner_email_address: String,
}

impl From<CourseOwnerRow> for CourseWithOwner {
    fn from(r: CourseOwnerRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            estimated_time: r.estimated_time,
            materials_needed: r.materials_needed,
            user_id: r.user_id,
            owner: UserSummary {
                id: r.user_id,
                first_name: r.owner_first_name,
                last_name: r.owner_last_name,
                email_address: r.owner_email_address,
            },
        }
    }
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email_address, password_hash, created_at, updated_at";

const COURSE_COLUMNS: &str = "id, title, description, estimated_time, materials_needed, user_id, created_at, updated_at";

const COURSE_WITH_OWNER_SELECT: &str = r#"
    SELECT c.id, c.title, c.description, c.estimated_time, c.materials_needed, c.user_id,
           u.first_name AS owner_first_name,
           u.last_name AS owner_last_name,
           u.email_address AS owner_email_address
      FROM courses c
      JOIN users u ON u.id = c.user_id
"#;

/// Turns a unique-constraint violation on insert into the validation error
/// clients see; everything else stays an internal failure.
fn map_user_insert_error(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::validation(EMAIL_IN_USE).into()
        }
        _ => anyhow::Error::new(err).context("insert user"),
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email_address))]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email_address, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email_address)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_insert_error)?;
        debug!(user_id = row.id, "User inserted");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email_address = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find user by id")?;
        Ok(row.map(User::from))
    }
}

#[derive(Clone)]
pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    #[instrument(skip(self))]
    async fn list_courses(&self) -> Result<Vec<CourseWithOwner>> {
        let rows = sqlx::query_as::<_, CourseOwnerRow>(&format!(
            "{COURSE_WITH_OWNER_SELECT} ORDER BY c.id"
        ))
        .fetch_all(&self.pool)
        .await
        .context("list courses")?;
        Ok(rows.into_iter().map(CourseWithOwner::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_course(&self, id: i64) -> Result<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find course")?;
        Ok(row.map(Course::from))
    }

    #[instrument(skip(self))]
    async fn find_course_with_owner(&self, id: i64) -> Result<Option<CourseWithOwner>> {
        let row = sqlx::query_as::<_, CourseOwnerRow>(&format!(
            "{COURSE_WITH_OWNER_SELECT} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find course with owner")?;
        Ok(row.map(CourseWithOwner::from))
    }

    #[instrument(skip(self, fields))]
    async fn create_course(&self, user_id: i64, fields: CourseFields) -> Result<Course> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            r#"
            INSERT INTO courses (title, description, estimated_time, materials_needed, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.estimated_time.flatten())
        .bind(fields.materials_needed.flatten())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("insert course")?;
        debug!(course_id = row.id, user_id, "Course inserted");
        Ok(row.into())
    }

    #[instrument(skip(self, fields))]
    async fn update_course(&self, id: i64, fields: CourseFields) -> Result<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            r#"
            UPDATE courses
               SET title = $2, description = $3,
                   estimated_time = CASE WHEN $4 THEN $5 ELSE estimated_time END,
                   materials_needed = CASE WHEN $6 THEN $7 ELSE materials_needed END,
                   updated_at = now()
             WHERE id = $1
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.estimated_time.is_some())
        .bind(fields.estimated_time.flatten())
        .bind(fields.materials_needed.is_some())
        .bind(fields.materials_needed.flatten())
        .fetch_optional(&self.pool)
        .await
        .context("update course")?;
        Ok(row.map(Course::from))
    }

    #[instrument(skip(self))]
    async fn delete_course(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete course")?;
        Ok(result.rows_affected() > 0)
    }
}
