//! Enrolment instances and user enrolments.

use chrono::{DateTime, Utc};
use rostersync_core::{CourseId, EnrolInstance, EnrolInstanceId, EnrolMethod};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A row of `enrol_instances`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EnrolInstanceRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub method: String,
    pub enrol_period_secs: i64,
}

impl EnrolInstanceRow {
    /// Convert to the domain type. `method` is the one the row was queried by.
    #[must_use]
    pub fn into_instance(self, method: EnrolMethod) -> EnrolInstance {
        EnrolInstance {
            id: EnrolInstanceId::from_uuid(self.id),
            course_id: CourseId::from_uuid(self.course_id),
            method,
            enrol_period_secs: self.enrol_period_secs,
        }
    }

    pub async fn find<'e, E>(
        executor: E,
        course_id: Uuid,
        method: EnrolMethod,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, course_id, method, enrol_period_secs FROM enrol_instances
            WHERE course_id = $1 AND method = $2
            ",
        )
        .bind(course_id)
        .bind(method.as_str())
        .fetch_optional(executor)
        .await
    }

    /// Insert an instance. `None` when the course already has one for `method`.
    pub async fn create<'e, E>(
        executor: E,
        course_id: Uuid,
        method: EnrolMethod,
        enrol_period_secs: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO enrol_instances (id, course_id, method, enrol_period_secs)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (course_id, method) DO NOTHING
            RETURNING id, course_id, method, enrol_period_secs
            ",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(method.as_str())
        .bind(enrol_period_secs)
        .fetch_optional(executor)
        .await
    }
}

/// The `user_enrolments` table.
pub struct UserEnrolment;

impl UserEnrolment {
    /// Record an enrolment. An existing enrolment is left untouched.
    pub async fn create<'e, E>(
        executor: E,
        instance_id: Uuid,
        user_id: Uuid,
        time_start: DateTime<Utc>,
        time_end: Option<DateTime<Utc>>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            INSERT INTO user_enrolments (instance_id, user_id, time_start, time_end)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (instance_id, user_id) DO NOTHING
            ",
        )
        .bind(instance_id)
        .bind(user_id)
        .bind(time_start)
        .bind(time_end)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_instance<'e, E>(executor: E, instance_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_enrolments WHERE instance_id = $1")
                .bind(instance_id)
                .fetch_one(executor)
                .await?;
        Ok(row.0)
    }
}
