//! Courses.

use rostersync_core::{ContextId, Course, CourseId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A row of `courses`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseRow {
    pub id: Uuid,
    pub context_id: Uuid,
    pub short_name: String,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            id: CourseId::from_uuid(row.id),
            context_id: ContextId::from_uuid(row.context_id),
            short_name: row.short_name,
        }
    }
}

impl CourseRow {
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, context_id, short_name FROM courses
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Context of a course, if the course exists.
    pub async fn context_of<'e, E>(executor: E, id: Uuid) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT context_id FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row.map(|(context_id,)| context_id))
    }

    /// Insert the course unless it already exists.
    pub async fn upsert<'e, E>(executor: E, course: &Course) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            INSERT INTO courses (id, context_id, short_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(course.id.into_inner())
        .bind(course.context_id.into_inner())
        .bind(&course.short_name)
        .execute(executor)
        .await?;
        Ok(())
    }
}
