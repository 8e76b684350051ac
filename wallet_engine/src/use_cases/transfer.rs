use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::directory::UserDirectory;
use crate::domain::entities::{Transaction, Wallet};
use crate::domain::error::EngineError;
use crate::domain::notification::{NotificationEvent, NotificationKind, NotificationSink};
use crate::domain::repository::{AtomicUnitFactory, WalletRepository};
use crate::domain::types::{TransactionStatus, TransactionType, UserId};
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;
use crate::support::short_hex_code;

pub struct TransferOutcome {
    pub reference: String,
}

/// Initiates a two-phase transfer: debits the sender immediately (a hold) and writes both
/// PENDING legs in one atomic unit. The recipient is not credited until they accept.
pub struct TransferUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    directory: Arc<dyn UserDirectory>,
    atomic_units: Arc<dyn AtomicUnitFactory>,
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<TransactionListCache>,
    transfer_expiry_hours: i64,
}

impl TransferUseCase {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        directory: Arc<dyn UserDirectory>,
        atomic_units: Arc<dyn AtomicUnitFactory>,
        notifications: Arc<dyn NotificationSink>,
        cache: Arc<TransactionListCache>,
        transfer_expiry_hours: i64,
    ) -> Self {
        Self {
            wallet_repo,
            directory,
            atomic_units,
            notifications,
            cache,
            transfer_expiry_hours,
        }
    }

    #[tracing::instrument(name = "TransferUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        sender_user_id: UserId,
        recipient_username: &str,
        amount: Decimal,
    ) -> Result<TransferOutcome, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::NonPositiveAmount);
        }

        let recipient_user_id = self.directory.resolve_username(recipient_username).await?;
        if recipient_user_id == sender_user_id {
            return Err(EngineError::SelfTransfer);
        }

        let sender_wallet = self.wallet_repo.find_by_owner(sender_user_id).await?;
        let recipient_wallet = self
            .wallet_repo
            .find_by_owner(recipient_user_id)
            .await
            .map_err(|_| EngineError::NoSuchUser(recipient_username.to_string()))?;

        let reference = format!("TRANSFER-{}", short_hex_code());
        self.run(&sender_wallet, &recipient_wallet, amount, &reference)
            .await?;
        self.cache.invalidate_wallet(sender_wallet.id());
        self.cache.invalidate_wallet(recipient_wallet.id());

        self.notifications
            .publish(NotificationEvent {
                kind: NotificationKind::TransferInitiated,
                transaction_id: crate::domain::types::TransactionId::new(),
                wallet_id: sender_wallet.id(),
                related_wallet_id: Some(recipient_wallet.id()),
                user_id: sender_user_id,
                amount,
                transaction_type: TransactionType::TransferOut,
                reference: reference.clone(),
                created_at: chrono::Utc::now(),
            })
            .await;
        self.notifications
            .publish(NotificationEvent {
                kind: NotificationKind::TransferInitiated,
                transaction_id: crate::domain::types::TransactionId::new(),
                wallet_id: recipient_wallet.id(),
                related_wallet_id: Some(sender_wallet.id()),
                user_id: recipient_user_id,
                amount,
                transaction_type: TransactionType::TransferIn,
                reference: reference.clone(),
                created_at: chrono::Utc::now(),
            })
            .await;

        Ok(TransferOutcome { reference })
    }

    async fn run(
        &self,
        sender: &Wallet,
        recipient: &Wallet,
        amount: Decimal,
        reference: &str,
    ) -> Result<(), EngineError> {
        let (first, second) = if sender.id() < recipient.id() {
            (sender.id(), recipient.id())
        } else {
            (recipient.id(), sender.id())
        };

        let mut unit = self.atomic_units.begin().await?;
        unit.lock_wallet(first).await?;
        unit.lock_wallet(second).await?;

        unit.apply_delta(sender.id(), -amount).await?;

        let expiry_time = chrono::Utc::now() + chrono::Duration::hours(self.transfer_expiry_hours);

        let out_leg = Transaction::new(
            sender.id(),
            Some(recipient.id()),
            amount,
            TransactionType::TransferOut,
            None,
            reference.to_string(),
            TransactionStatus::Pending,
            Some(expiry_time),
        )?;
        let in_leg = Transaction::new(
            recipient.id(),
            Some(sender.id()),
            amount,
            TransactionType::TransferIn,
            None,
            reference.to_string(),
            TransactionStatus::Pending,
            Some(expiry_time),
        )?;

        unit.insert_transaction(&out_leg).await?;
        unit.insert_transaction(&in_leg).await?;
        unit.commit().await?;

        Ok(())
    }
}
