//! User accounts.

use rostersync_core::{IdentifierField, User, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A row of `users`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub id_number: Option<String>,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            id_number: row.id_number,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

impl UserRow {
    /// Exact match on one identifier column. The first match wins when the
    /// column is not unique.
    pub async fn find_by_field<'e, E>(
        executor: E,
        field: IdentifierField,
        value: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = match field {
            IdentifierField::Username => {
                r"
                SELECT id, username, id_number, email, first_name, last_name
                FROM users WHERE username = $1
                ORDER BY created_at, id LIMIT 1
                "
            }
            IdentifierField::IdNumber => {
                r"
                SELECT id, username, id_number, email, first_name, last_name
                FROM users WHERE id_number = $1
                ORDER BY created_at, id LIMIT 1
                "
            }
            IdentifierField::Email => {
                r"
                SELECT id, username, id_number, email, first_name, last_name
                FROM users WHERE email = $1
                ORDER BY created_at, id LIMIT 1
                "
            }
        };
        sqlx::query_as::<_, Self>(sql)
            .bind(value)
            .fetch_optional(executor)
            .await
    }

    /// Insert a user account.
    pub async fn create<'e, E>(executor: E, user: &User) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO users (id, username, id_number, email, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, id_number, email, first_name, last_name
            ",
        )
        .bind(user.id.into_inner())
        .bind(&user.username)
        .bind(&user.id_number)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(executor)
        .await
    }
}
