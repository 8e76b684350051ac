use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::error::EngineError;
use crate::domain::repository::IdempotencyStore;

/// Backed by a single `idempotency_records` table keyed on `(scope, key)`. `try_claim` relies on
/// the unique constraint on that pair: the first insert wins, every later one hits a constraint
/// violation and reports the claim as already taken. Rows past `expires_at` are treated as
/// absent by every read; a passive TTL, not a background sweep, is what correctness depends on.
pub struct PostgresIdempotencyStore {
    pool: PgPool,
    ttl_hours: i64,
}

impl PostgresIdempotencyStore {
    pub fn new(pool: PgPool, ttl_hours: i64) -> Self {
        Self { pool, ttl_hours }
    }
}

#[async_trait]
impl IdempotencyStore for PostgresIdempotencyStore {
    async fn try_claim(&self, scope: &str, key: &str) -> Result<bool, EngineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO idempotency_records (scope, key, created_at, expires_at)
            VALUES ($1, $2, now(), now() + make_interval(hours => $3))
            ON CONFLICT (scope, key) DO NOTHING
            "#,
        )
        .bind(scope)
        .bind(key)
        .bind(self.ttl_hours as i32)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn store_response(
        &self,
        scope: &str,
        key: &str,
        response: &str,
    ) -> Result<(), EngineError> {
        sqlx::query(
            "UPDATE idempotency_records SET response = $1 WHERE scope = $2 AND key = $3",
        )
        .bind(response)
        .bind(scope)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_response(
        &self,
        scope: &str,
        key: &str,
    ) -> Result<Option<String>, EngineError> {
        let response: Option<Option<String>> = sqlx::query_scalar(
            "SELECT response FROM idempotency_records WHERE scope = $1 AND key = $2 AND expires_at > now()",
        )
        .bind(scope)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(response.flatten())
    }
}
