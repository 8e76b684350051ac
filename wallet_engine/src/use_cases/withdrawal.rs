use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::entities::{Transaction, Wallet};
use crate::domain::error::EngineError;
use crate::domain::notification::{NotificationEvent, NotificationKind, NotificationSink};
use crate::domain::repository::{AtomicUnitFactory, WalletRepository};
use crate::domain::types::{FundingSource, TransactionStatus, TransactionType, UserId};
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;

/// Immediate debit outside the cash-out/one-time-code flow. The funds check happens inside the
/// held lock (see [`crate::domain::repository::AtomicUnit::apply_delta`]'s non-negative
/// constraint), not as a pre-check, so concurrent withdrawals can't both see a sufficient
/// balance and both succeed.
pub struct WithdrawalUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    atomic_units: Arc<dyn AtomicUnitFactory>,
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<TransactionListCache>,
}

impl WithdrawalUseCase {
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

    #[tracing::instrument(name = "WithdrawalUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        owner_user_id: UserId,
        amount: Decimal,
        reference: String,
    ) -> Result<Transaction, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::NonPositiveAmount);
        }

        let wallet = self.wallet_repo.find_by_owner(owner_user_id).await?;
        let transaction = self.run(&wallet, amount, reference).await?;
        self.cache.invalidate_wallet(wallet.id());

        self.notifications
            .publish(NotificationEvent {
                kind: NotificationKind::WithdrawalCompleted,
                transaction_id: transaction.id(),
                wallet_id: wallet.id(),
                related_wallet_id: None,
                user_id: owner_user_id,
                amount,
                transaction_type: TransactionType::Withdrawal,
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
        reference: String,
    ) -> Result<Transaction, EngineError> {
        let mut unit = self.atomic_units.begin().await?;
        unit.lock_wallet(wallet.id()).await?;
        unit.apply_delta(wallet.id(), -amount).await?;

        let transaction = Transaction::new(
            wallet.id(),
            None,
            amount,
            TransactionType::Withdrawal,
            Some(FundingSource::Internal),
            reference,
            TransactionStatus::Completed,
            None,
        )?;
        unit.insert_transaction(&transaction).await?;
        unit.commit().await?;

        Ok(transaction)
    }
}
