use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::directory::UserDirectory;
use crate::domain::error::EngineError;
use crate::domain::types::UserId;

/// Read-mostly mirror of the external identity system, kept current by `upsert` calls driven
/// off that system's "user created/updated" signal (see `on_user_provisioned` in the facade).
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn resolve_username(&self, username: &str) -> Result<UserId, EngineError> {
        let user_id: UserId = sqlx::query_scalar(
            "SELECT user_id FROM users_directory WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EngineError::NoSuchUser(username.to_string()))?;

        Ok(user_id)
    }

    async fn upsert(
        &self,
        user_id: UserId,
        username: &str,
        phone_number: &str,
        is_staff: bool,
    ) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO users_directory (user_id, username, phone_number, is_staff)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET username = EXCLUDED.username,
                phone_number = EXCLUDED.phone_number,
                is_staff = EXCLUDED.is_staff
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(phone_number)
        .bind(is_staff)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
