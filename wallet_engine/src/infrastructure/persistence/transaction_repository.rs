use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::Transaction;
use crate::domain::error::EngineError;
use crate::domain::repository::{TransactionPage, TransactionRepository};
use crate::domain::types::{TransactionId, TransactionStatus, TransactionType, WalletId};
use crate::infrastructure::persistence::models::TransactionModel;

pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn find_by_id(&self, id: TransactionId) -> Result<Transaction, EngineError> {
        let model =
            sqlx::query_as::<_, TransactionModel>("SELECT * FROM transactions WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(model.into())
    }

    async fn find_transfer_legs(
        &self,
        reference: &str,
    ) -> Result<(Transaction, Transaction), EngineError> {
        let models = sqlx::query_as::<_, TransactionModel>(
            "SELECT * FROM transactions WHERE reference = $1",
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;

        let mut in_leg = None;
        let mut out_leg = None;
        for model in models {
            match model.transaction_type {
                TransactionType::TransferIn => in_leg = Some(model.into()),
                TransactionType::TransferOut => out_leg = Some(model.into()),
                _ => {}
            }
        }

        match (in_leg, out_leg) {
            (Some(i), Some(o)) => Ok((i, o)),
            _ => Err(EngineError::NotFound),
        }
    }

    async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<TransactionPage, EngineError> {
        let models = sqlx::query_as::<_, TransactionModel>(
            r#"
            SELECT * FROM transactions
            WHERE wallet_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(wallet_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE wallet_id = $1")
                .bind(wallet_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(TransactionPage {
            items: models.into_iter().map(Into::into).collect(),
            total,
        })
    }

    async fn find_pending_past_expiry(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, EngineError> {
        let models = sqlx::query_as::<_, TransactionModel>(
            r#"
            SELECT * FROM transactions
            WHERE status = $1 AND expiry_time IS NOT NULL AND expiry_time <= $2
            ORDER BY expiry_time ASC
            LIMIT 500
            "#,
        )
        .bind(TransactionStatus::Pending)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
