use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;

use crate::domain::entities::{Transaction, Wallet};
use crate::domain::error::EngineError;
use crate::domain::notification::{NotificationEvent, NotificationKind, NotificationSink};
use crate::domain::repository::{AtomicUnitFactory, WalletRepository};
use crate::domain::types::{FundingSource, TransactionStatus, TransactionType, UserId};
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;
use crate::support::short_hex_code;

pub struct CashOutRequestOutcome {
    pub withdrawal_code: String,
    pub amount: Decimal,
    pub phone_number: String,
}

/// Reserves a one-time withdrawal code without touching the balance yet — the debit happens
/// at verification, not at request time, because the code (not the request) is the bearer
/// artifact an ATM redeems.
pub struct CashOutRequestUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    atomic_units: Arc<dyn AtomicUnitFactory>,
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<TransactionListCache>,
    cash_out_expiry_minutes: i64,
}

impl CashOutRequestUseCase {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        atomic_units: Arc<dyn AtomicUnitFactory>,
        notifications: Arc<dyn NotificationSink>,
        cache: Arc<TransactionListCache>,
        cash_out_expiry_minutes: i64,
    ) -> Self {
        Self {
            wallet_repo,
            atomic_units,
            notifications,
            cache,
            cash_out_expiry_minutes,
        }
    }

    #[tracing::instrument(name = "CashOutRequestUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        owner_user_id: UserId,
        amount: Decimal,
    ) -> Result<CashOutRequestOutcome, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::NonPositiveAmount);
        }

        let wallet = self.wallet_repo.find_by_owner(owner_user_id).await?;
        if wallet.balance() < amount {
            return Err(EngineError::InsufficientFunds(wallet.id()));
        }

        let code = short_hex_code();
        let transaction = self.write_request(&wallet, amount, &code).await?;
        self.cache.invalidate_wallet(wallet.id());

        self.notifications
            .publish(NotificationEvent {
                kind: NotificationKind::CashOutRequested,
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

        Ok(CashOutRequestOutcome {
            withdrawal_code: code,
            amount,
            phone_number: wallet.phone_number().to_string(),
        })
    }

    async fn write_request(
        &self,
        wallet: &Wallet,
        amount: Decimal,
        code: &str,
    ) -> Result<Transaction, EngineError> {
        let mut unit = self.atomic_units.begin().await?;

        let transaction = Transaction::new(
            wallet.id(),
            None,
            amount,
            TransactionType::Withdrawal,
            Some(FundingSource::BlfAtm),
            format!("BLF-ATM-{code}"),
            TransactionStatus::Pending,
            Some(chrono::Utc::now() + Duration::minutes(self.cash_out_expiry_minutes)),
        )?;
        unit.insert_transaction(&transaction).await?;
        unit.commit().await?;

        Ok(transaction)
    }
}
