use std::sync::Arc;

use crate::domain::entities::Wallet;
use crate::domain::error::EngineError;
use crate::domain::repository::WalletRepository;
use crate::domain::types::{Currency, UserId};

/// Explicit wallet provisioning. Unlike [`crate::use_cases::create_wallet::CreateWalletUseCase::on_user_provisioned`],
/// an explicit call is not idempotent from the caller's point of view: calling it for a user who
/// already has a wallet is a client error, not a no-op.
pub struct CreateWalletUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
}

impl CreateWalletUseCase {
    pub fn new(wallet_repo: Arc<dyn WalletRepository>) -> Self {
        Self { wallet_repo }
    }

    #[tracing::instrument(name = "CreateWalletUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        owner_user_id: UserId,
        phone_number: &str,
        currency: Currency,
    ) -> Result<Wallet, EngineError> {
        if self.wallet_repo.find_by_owner(owner_user_id).await.is_ok() {
            return Err(EngineError::AlreadyExists(owner_user_id));
        }

        self.wallet_repo
            .get_or_create(owner_user_id, phone_number, currency)
            .await
    }

    /// Reacts to the identity collaborator's "user created" signal. Converges with a racing
    /// explicit [`Self::execute`] call on one wallet rather than erroring, since neither caller
    /// chose to collide — the race is inherent to the signal arriving independently of the HTTP
    /// request.
    #[tracing::instrument(name = "CreateWalletUseCase::on_user_provisioned", skip(self))]
    pub async fn on_user_provisioned(
        &self,
        user_id: UserId,
        phone_number: &str,
        is_staff: bool,
        currency: Currency,
    ) -> Result<(), EngineError> {
        if is_staff {
            return Ok(());
        }
        self.wallet_repo
            .get_or_create(user_id, phone_number, currency)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockWalletRepository;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn execute_fails_already_exists_when_wallet_present() {
        let mut mock_repo = MockWalletRepository::new();
        let user_id = UserId::new();
        mock_repo
            .expect_find_by_owner()
            .with(eq(user_id))
            .times(1)
            .returning(move |owner| {
                Ok(Wallet::builder()
                    .owner_user_id(owner)
                    .phone_number("96170000000".into())
                    .currency(Currency::Usd)
                    .build()
                    .unwrap())
            });

        let use_case = CreateWalletUseCase::new(Arc::new(mock_repo));
        let result = use_case.execute(user_id, "96170000000", Currency::Usd).await;

        assert!(matches!(result, Err(EngineError::AlreadyExists(id)) if id == user_id));
    }

    #[tokio::test]
    async fn execute_creates_when_absent() {
        let mut mock_repo = MockWalletRepository::new();
        let user_id = UserId::new();
        mock_repo
            .expect_find_by_owner()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Err(EngineError::NotFound));
        mock_repo
            .expect_get_or_create()
            .times(1)
            .returning(move |owner, phone, currency| {
                Ok(Wallet::builder()
                    .owner_user_id(owner)
                    .phone_number(phone.to_string())
                    .currency(currency)
                    .build()
                    .unwrap())
            });

        let use_case = CreateWalletUseCase::new(Arc::new(mock_repo));
        let result = use_case.execute(user_id, "96171111111", Currency::Eur).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn on_user_provisioned_skips_staff() {
        let mock_repo = MockWalletRepository::new();
        let use_case = CreateWalletUseCase::new(Arc::new(mock_repo));
        let result = use_case
            .on_user_provisioned(UserId::new(), "96170000000", true, Currency::Usd)
            .await;
        assert!(result.is_ok());
    }
}
