//! Course groupings and the groups linked into them.

use chrono::{DateTime, Utc};
use rostersync_core::{CourseId, Grouping, GroupingId, NewGrouping};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A row of `groupings`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupingRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
}

impl From<GroupingRow> for Grouping {
    fn from(row: GroupingRow) -> Self {
        Self {
            id: GroupingId::from_uuid(row.id),
            course_id: CourseId::from_uuid(row.course_id),
            name: row.name,
        }
    }
}

impl GroupingRow {
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
            SELECT id, course_id, name FROM groupings
            WHERE course_id = $1 AND name = $2
            ",
        )
        .bind(course_id)
        .bind(name)
        .fetch_optional(executor)
        .await
    }

    /// Insert a grouping. `None` when the name is already taken in the course.
    pub async fn create<'e, E>(
        executor: E,
        grouping: &NewGrouping,
    ) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r"
            INSERT INTO groupings (id, course_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (course_id, name) DO NOTHING
            RETURNING id
            ",
        )
        .bind(Uuid::new_v4())
        .bind(grouping.course_id.into_inner())
        .bind(&grouping.name)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}

/// The `groupings_groups` link table.
pub struct GroupingGroup;

impl GroupingGroup {
    pub async fn exists<'e, E>(
        executor: E,
        group_id: Uuid,
        grouping_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS (
                SELECT 1 FROM groupings_groups WHERE group_id = $1 AND grouping_id = $2
            )
            ",
        )
        .bind(group_id)
        .bind(grouping_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Link a group into a grouping. `None` when the link already exists.
    pub async fn create<'e, E>(
        executor: E,
        group_id: Uuid,
        grouping_id: Uuid,
        time_added: DateTime<Utc>,
    ) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r"
            INSERT INTO groupings_groups (id, grouping_id, group_id, time_added)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (grouping_id, group_id) DO NOTHING
            RETURNING id
            ",
        )
        .bind(Uuid::new_v4())
        .bind(grouping_id)
        .bind(group_id)
        .bind(time_added)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}
