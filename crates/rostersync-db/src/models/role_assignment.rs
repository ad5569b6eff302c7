//! Role assignments within a context.

use sqlx::PgExecutor;
use uuid::Uuid;

/// The `role_assignments` table.
pub struct RoleAssignment;

impl RoleAssignment {
    pub async fn exists<'e, E>(
        executor: E,
        user_id: Uuid,
        role_id: Uuid,
        context_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS (
                SELECT 1 FROM role_assignments
                WHERE user_id = $1 AND role_id = $2 AND context_id = $3
            )
            ",
        )
        .bind(user_id)
        .bind(role_id)
        .bind(context_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Grant the role. Returns `false` if it was already held.
    pub async fn create<'e, E>(
        executor: E,
        user_id: Uuid,
        role_id: Uuid,
        context_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            INSERT INTO role_assignments (user_id, role_id, context_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(role_id)
        .bind(context_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
