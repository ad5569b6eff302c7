//! Course groups and their members.

use rostersync_core::{CourseId, Group, GroupId, NewGroup};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A row of `groups`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub lang: String,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: GroupId::from_uuid(row.id),
            course_id: CourseId::from_uuid(row.course_id),
            name: row.name,
            lang: row.lang,
        }
    }
}

impl GroupRow {
    pub async fn find_by_name<'e, E>(
        executor: E,
        course_id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, course_id, name, lang FROM groups
            WHERE course_id = $1 AND name = $2
            ",
        )
        .bind(course_id)
        .bind(name)
        .fetch_optional(executor)
        .await
    }

    /// Insert a group. `None` when the name is already taken in the course.
    pub async fn create<'e, E>(executor: E, group: &NewGroup) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r"
            INSERT INTO groups (id, course_id, name, lang)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (course_id, name) DO NOTHING
            RETURNING id
            ",
        )
        .bind(Uuid::new_v4())
        .bind(group.course_id.into_inner())
        .bind(&group.name)
        .bind(&group.lang)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    pub async fn list_for_course<'e, E>(executor: E, course_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, course_id, name, lang FROM groups
            WHERE course_id = $1
            ORDER BY name
            ",
        )
        .bind(course_id)
        .fetch_all(executor)
        .await
    }
}

/// The `group_members` table.
pub struct GroupMember;

impl GroupMember {
    pub async fn exists<'e, E>(executor: E, group_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS (
                SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2
            )
            ",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Add a member. Returns `false` if nothing was inserted.
    pub async fn add<'e, E>(executor: E, group_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            INSERT INTO group_members (group_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (group_id, user_id) DO NOTHING
            ",
        )
        .bind(group_id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count<'e, E>(executor: E, group_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}
