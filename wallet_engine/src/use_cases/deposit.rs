use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::entities::{Transaction, Wallet};
use crate::domain::error::EngineError;
use crate::domain::notification::{NotificationEvent, NotificationKind, NotificationSink};
use crate::domain::repository::{AtomicUnitFactory, WalletRepository};
use crate::domain::types::{FundingSource, TransactionStatus, TransactionType};
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;

/// Single-shot credit to a wallet. No state machine: the transaction is written COMPLETED in
/// the same atomic unit as the balance change.
pub struct DepositUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    atomic_units: Arc<dyn AtomicUnitFactory>,
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<TransactionListCache>,
}

impl DepositUseCase {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        atomic_units: Arc<dyn AtomicUnitFactory>,
        notifications: Arc<dyn NotificationSink>,
        cache: Arc<TransactionListCache>,
    ) -> Self {
        Self {
            wallet_repo,
            atomic_units,
            notifications,
            cache,
        }
    }

    #[tracing::instrument(name = "DepositUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        phone_number: &str,
        amount: Decimal,
        funding_source: FundingSource,
        reference: String,
    ) -> Result<Transaction, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::NonPositiveAmount);
        }

        let wallet = self.wallet_repo.find_by_phone(phone_number).await?;
        let transaction = self.run(&wallet, amount, funding_source, reference).await?;
        self.cache.invalidate_wallet(wallet.id());

        self.notifications
            .publish(NotificationEvent {
                kind: NotificationKind::DepositCompleted,
                transaction_id: transaction.id(),
                wallet_id: transaction.wallet_id(),
                related_wallet_id: None,
                user_id: wallet.owner_user_id(),
                amount: transaction.amount(),
                transaction_type: transaction.transaction_type(),
                reference: transaction.reference().to_string(),
                created_at: transaction.created_at(),
            })
            .await;

        Ok(transaction)
    }

    async fn run(
        &self,
        wallet: &Wallet,
        amount: Decimal,
        funding_source: FundingSource,
        reference: String,
    ) -> Result<Transaction, EngineError> {
        let mut unit = self.atomic_units.begin().await?;
        unit.lock_wallet(wallet.id()).await?;
        unit.apply_delta(wallet.id(), amount).await?;

        let transaction = Transaction::new(
            wallet.id(),
            None,
            amount,
            TransactionType::Deposit,
            Some(funding_source),
            reference,
            TransactionStatus::Completed,
            None,
        )?;
        unit.insert_transaction(&transaction).await?;
        unit.commit().await?;

        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::{AtomicUnit, LockedWallet, MockAtomicUnitFactory, MockWalletRepository};
    use crate::domain::types::{Currency, TransactionId, TransactionStatus as Status, WalletId};
    use async_trait::async_trait;
    use mockall::mock;

    struct NullSink;
    #[async_trait]
    impl NotificationSink for NullSink {
        async fn publish(&self, _event: NotificationEvent) {}
    }

    mock! {
        pub Unit {}

        #[async_trait]
        impl AtomicUnit for Unit {
            async fn lock_wallet(&mut self, id: WalletId) -> Result<LockedWallet, EngineError>;
            async fn apply_delta(&mut self, id: WalletId, delta: Decimal) -> Result<(), EngineError>;
            async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), EngineError>;
            async fn update_status(&mut self, id: TransactionId, status: Status) -> Result<(), EngineError>;
            async fn lock_pending_cash_out(&mut self, phone_number: &str, code: &str) -> Result<Option<(Transaction, LockedWallet)>, EngineError>;
            async fn commit(self: Box<Self>) -> Result<(), EngineError>;
        }
    }

    fn sample_wallet() -> Wallet {
        Wallet::builder()
            .owner_user_id(UserId_for_test())
            .phone_number("96170000000".into())
            .currency(Currency::Usd)
            .build()
            .unwrap()
    }

    #[allow(non_snake_case)]
    fn UserId_for_test() -> crate::domain::types::UserId {
        crate::domain::types::UserId::new()
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let wallet_repo = MockWalletRepository::new();
        let atomic_units = MockAtomicUnitFactory::new();
        let use_case = DepositUseCase::new(
            Arc::new(wallet_repo),
            Arc::new(atomic_units),
            Arc::new(NullSink),
            test_cache(),
        );

        let result = use_case
            .execute("96170000000", Decimal::ZERO, FundingSource::Paysend, "Paysend: tx1".into())
            .await;

        assert!(matches!(result, Err(EngineError::NonPositiveAmount)));
    }

    #[tokio::test]
    async fn credits_wallet_and_writes_completed_transaction() {
        let wallet = sample_wallet();
        let wallet_id = wallet.id();
        let mut wallet_repo = MockWalletRepository::new();
        wallet_repo
            .expect_find_by_phone()
            .returning(move |_| Ok(wallet.clone()));

        let mut atomic_units = MockAtomicUnitFactory::new();
        atomic_units.expect_begin().times(1).returning(move || {
            let mut unit = MockUnit::new();
            unit.expect_lock_wallet()
                .returning(move |id| Ok(LockedWallet { wallet: sample_wallet_with_id(id) }));
            unit.expect_apply_delta().returning(|_, _| Ok(()));
            unit.expect_insert_transaction().returning(|_| Ok(()));
            unit.expect_commit().returning(|| Ok(()));
            Ok(Box::new(unit) as Box<dyn AtomicUnit>)
        });

        let use_case = DepositUseCase::new(
            Arc::new(wallet_repo),
            Arc::new(atomic_units),
            Arc::new(NullSink),
            test_cache(),
        );

        let result = use_case
            .execute(
                "96170000000",
                Decimal::new(5000, 2),
                FundingSource::Paysend,
                "Paysend: tx1".into(),
            )
            .await
            .unwrap();

        assert_eq!(result.wallet_id(), wallet_id);
        assert_eq!(result.status(), Status::Completed);
    }

    fn test_cache() -> Arc<TransactionListCache> {
        Arc::new(TransactionListCache::new(std::time::Duration::from_secs(900)))
    }

    fn sample_wallet_with_id(id: WalletId) -> Wallet {
        Wallet::reconstitute(
            id,
            UserId_for_test(),
            Decimal::ZERO,
            Currency::Usd,
            "96170000000".into(),
            true,
            chrono::Utc::now(),
            chrono::Utc::now(),
        )
    }
}
