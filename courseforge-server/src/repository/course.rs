//! Course Repository
//!
//! Postgres implementation of [`CourseStore`]. Every status write is a single
//! `UPDATE ... WHERE id = $n AND status = $m`, so the row count tells whether
//! the transition's precondition still held.

use async_trait::async_trait;
use courseforge_core::domain::course::{Course, CourseOwner, CourseStatus, ProcessingCourse};
use courseforge_core::domain::layout::CourseLayout;
use courseforge_core::domain::transition::Transition;
use courseforge_core::store::{CourseStore, StoreError};
use sqlx::PgPool;
use sqlx::types::Json;

pub struct PgCourseStore {
    pool: PgPool,
}

impl PgCourseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseStore for PgCourseStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Course>, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, user_id, title, description, difficulty, status, layout, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Course::try_from).transpose()
    }

    async fn find_oldest_pending(&self) -> Result<Option<Course>, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, user_id, title, description, difficulty, status, layout, created_at
            FROM courses
            WHERE status = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(CourseStatus::Pending.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Course::try_from).transpose()
    }

    async fn transition(&self, id: &str, transition: Transition) -> Result<bool, StoreError> {
        // Succeed must carry a layout
        if transition == Transition::Succeed {
            return Err(StoreError::Database(
                "Succeed is only applied through complete()".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE courses
            SET status = $1
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(transition.target().as_str())
        .bind(id)
        .bind(transition.source().as_str())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn complete(&self, id: &str, layout: &CourseLayout) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET status = $1, layout = $2
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(Transition::Succeed.target().as_str())
        .bind(Json(layout))
        .bind(id)
        .bind(Transition::Succeed.source().as_str())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_processing(&self) -> Result<Vec<ProcessingCourse>, StoreError> {
        let rows = sqlx::query_as::<_, ProcessingRow>(
            r#"
            SELECT c.id, c.title, c.description, c.difficulty,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email
            FROM courses c
            JOIN users u ON u.id = c.user_id
            WHERE c.status = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(CourseStatus::LayoutProcessing.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn database_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: String,
    user_id: String,
    title: Option<String>,
    description: Option<String>,
    difficulty: Option<String>,
    status: String,
    layout: Option<serde_json::Value>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<CourseRow> for Course {
    type Error = StoreError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<CourseStatus>()
            .map_err(StoreError::Serialization)?;

        let layout = row
            .layout
            .map(serde_json::from_value::<CourseLayout>)
            .transpose()
            .map_err(|e| {
                StoreError::Serialization(format!("invalid layout of course {}: {}", row.id, e))
            })?;

        Ok(Course {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            difficulty: row.difficulty,
            status,
            layout,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProcessingRow {
    id: String,
    title: Option<String>,
    description: Option<String>,
    difficulty: Option<String>,
    user_id: String,
    user_name: Option<String>,
    user_email: String,
}

impl From<ProcessingRow> for ProcessingCourse {
    fn from(row: ProcessingRow) -> Self {
        ProcessingCourse {
            id: row.id,
            title: row.title,
            description: row.description,
            difficulty: row.difficulty,
            user: CourseOwner {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
        }
    }
}
