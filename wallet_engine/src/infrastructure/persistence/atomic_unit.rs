use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};

use crate::domain::entities::Transaction;
use crate::domain::error::EngineError;
use crate::domain::repository::{AtomicUnit, AtomicUnitFactory, LockedWallet};
use crate::domain::types::{TransactionId, TransactionStatus, WalletId};
use crate::infrastructure::persistence::models::{TransactionModel, WalletModel};

pub struct PostgresAtomicUnitFactory {
    pool: PgPool,
}

impl PostgresAtomicUnitFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AtomicUnitFactory for PostgresAtomicUnitFactory {
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>, EngineError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresAtomicUnit { tx: Some(tx) }))
    }
}

/// Wraps a single `sqlx::Transaction`. Every method borrows the live transaction out of `tx`;
/// `commit` consumes it. If `commit` is never called the transaction drops and rolls back —
/// this is what gives a cancelled request or an early `?` return its all-or-nothing behavior.
pub struct PostgresAtomicUnit {
    tx: Option<SqlxTransaction<'static, Postgres>>,
}

impl PostgresAtomicUnit {
    fn tx_mut(&mut self) -> &mut SqlxTransaction<'static, Postgres> {
        self.tx.as_mut().expect("atomic unit used after commit")
    }
}

#[async_trait]
impl AtomicUnit for PostgresAtomicUnit {
    async fn lock_wallet(&mut self, id: WalletId) -> Result<LockedWallet, EngineError> {
        let model = sqlx::query_as::<_, WalletModel>(
            "SELECT * FROM wallets WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_one(self.tx_mut())
        .await?;

        Ok(LockedWallet {
            wallet: model.into(),
        })
    }

    async fn apply_delta(&mut self, id: WalletId, delta: Decimal) -> Result<(), EngineError> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance + $1, updated_at = now()
            WHERE id = $2
            "#,
        )
        .bind(delta)
        .bind(id)
        .execute(self.tx_mut())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some("wallets_balance_non_negative") =>
            {
                EngineError::InsufficientFunds(id)
            }
            _ => EngineError::from(e),
        })?;

        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound);
        }

        Ok(())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, wallet_id, related_wallet_id, amount, transaction_type,
                funding_source, reference, status, created_at, updated_at, expiry_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(transaction.id())
        .bind(transaction.wallet_id())
        .bind(transaction.related_wallet_id())
        .bind(transaction.amount())
        .bind(transaction.transaction_type())
        .bind(transaction.funding_source())
        .bind(transaction.reference())
        .bind(transaction.status())
        .bind(transaction.created_at())
        .bind(transaction.updated_at())
        .bind(transaction.expiry_time())
        .execute(self.tx_mut())
        .await?;

        Ok(())
    }

    async fn update_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<(), EngineError> {
        let result = sqlx::query(
            "UPDATE transactions SET status = $1, updated_at = now() WHERE id = $2",
        )
        .bind(status)
        .bind(id)
        .execute(self.tx_mut())
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound);
        }

        Ok(())
    }

    async fn lock_pending_cash_out(
        &mut self,
        phone_number: &str,
        code: &str,
    ) -> Result<Option<(Transaction, LockedWallet)>, EngineError> {
        let suffix = format!("%{}", code);
        let row = sqlx::query_as::<_, TransactionModel>(
            r#"
            SELECT t.* FROM transactions t
            JOIN wallets w ON w.id = t.wallet_id
            WHERE w.phone_number = $1
              AND t.status = $2
              AND t.reference LIKE $3
            FOR UPDATE OF t
            "#,
        )
        .bind(phone_number)
        .bind(TransactionStatus::Pending)
        .bind(suffix)
        .fetch_optional(self.tx_mut())
        .await?;

        let Some(model) = row else {
            return Ok(None);
        };
        let transaction: Transaction = model.into();

        let wallet_model = sqlx::query_as::<_, WalletModel>(
            "SELECT * FROM wallets WHERE id = $1 FOR UPDATE",
        )
        .bind(transaction.wallet_id())
        .fetch_one(self.tx_mut())
        .await?;

        Ok(Some((
            transaction,
            LockedWallet {
                wallet: wallet_model.into(),
            },
        )))
    }

    async fn commit(mut self: Box<Self>) -> Result<(), EngineError> {
        let tx = self.tx.take().expect("atomic unit used after commit");
        tx.commit().await?;
        Ok(())
    }
}
