use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::Wallet;
use crate::domain::error::EngineError;
use crate::domain::repository::WalletRepository;
use crate::domain::types::{Currency, UserId, WalletId};
use crate::infrastructure::persistence::models::WalletModel;

pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, wallet: &Wallet) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO wallets (id, owner_user_id, balance, currency, phone_number, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(wallet.id())
        .bind(wallet.owner_user_id())
        .bind(wallet.balance())
        .bind(wallet.currency())
        .bind(wallet.phone_number())
        .bind(wallet.is_active())
        .bind(wallet.created_at())
        .bind(wallet.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletRepository {
    async fn get_or_create(
        &self,
        owner_user_id: UserId,
        phone_number: &str,
        currency: Currency,
    ) -> Result<Wallet, EngineError> {
        if let Ok(existing) = self.find_by_owner(owner_user_id).await {
            return Ok(existing);
        }

        let wallet = Wallet::builder()
            .owner_user_id(owner_user_id)
            .phone_number(phone_number.to_string())
            .currency(currency)
            .build()?;

        match self.insert(&wallet).await {
            Ok(()) => Ok(wallet),
            Err(EngineError::DuplicatePhone(msg)) => Err(EngineError::DuplicatePhone(msg)),
            // Lost a race against a concurrent creator for the same owner; their row wins.
            Err(_) => self.find_by_owner(owner_user_id).await,
        }
    }

    async fn find_by_id(&self, id: WalletId) -> Result<Wallet, EngineError> {
        let model = sqlx::query_as::<_, WalletModel>("SELECT * FROM wallets WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(model.into())
    }

    async fn find_by_owner(&self, owner_user_id: UserId) -> Result<Wallet, EngineError> {
        let model =
            sqlx::query_as::<_, WalletModel>("SELECT * FROM wallets WHERE owner_user_id = $1")
                .bind(owner_user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(model.into())
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Wallet, EngineError> {
        let model =
            sqlx::query_as::<_, WalletModel>("SELECT * FROM wallets WHERE phone_number = $1")
                .bind(phone_number)
                .fetch_one(&self.pool)
                .await?;

        Ok(model.into())
    }
}
