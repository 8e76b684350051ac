use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::domain::entities::Transaction;
use crate::domain::error::EngineError;
use crate::domain::notification::{NotificationEvent, NotificationKind, NotificationSink};
use crate::domain::repository::{AtomicUnitFactory, TransactionRepository, WalletRepository};
use crate::domain::types::{TransactionStatus, TransactionType};
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;

/// Periodic job that reclaims PENDING transfers and cash-outs left unresolved past their
/// `expiry_time`. Mirrors the donor's retry job in shape (fixed-interval tick, one bad row
/// logged and skipped rather than aborting the batch) but reclaims instead of retries.
///
/// The row cap that bounds one run's work lives in
/// [`TransactionRepository::find_pending_past_expiry`]'s `LIMIT`, not here — leftover rows
/// are simply still PENDING past their expiry next time this runs.
pub struct ExpiryWorker {
    transaction_repo: Arc<dyn TransactionRepository>,
    wallet_repo: Arc<dyn WalletRepository>,
    atomic_units: Arc<dyn AtomicUnitFactory>,
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<TransactionListCache>,
}

impl ExpiryWorker {
    pub fn new(
        transaction_repo: Arc<dyn TransactionRepository>,
        wallet_repo: Arc<dyn WalletRepository>,
        atomic_units: Arc<dyn AtomicUnitFactory>,
        notifications: Arc<dyn NotificationSink>,
        cache: Arc<TransactionListCache>,
    ) -> Self {
        Self {
            transaction_repo,
            wallet_repo,
            atomic_units,
            notifications,
            cache,
        }
    }

    /// Runs one pass. Returns the number of transactions moved to EXPIRED. Idempotent: a row
    /// already expired by a previous pass (or by the use case that raced it to a terminal
    /// status) simply won't be returned by the next pass's query.
    #[tracing::instrument(name = "ExpiryWorker::run", skip(self))]
    pub async fn run(&self) -> usize {
        let rows = match self.transaction_repo.find_pending_past_expiry(Utc::now()).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "expiry worker failed to query pending-past-expiry rows");
                return 0;
            }
        };

        if rows.is_empty() {
            return 0;
        }
        info!(count = rows.len(), "expiry worker reclaiming pending rows past their expiry");

        let mut expired = 0;
        for row in rows {
            let outcome = match row.transaction_type() {
                TransactionType::TransferOut => self.expire_transfer(&row).await,
                TransactionType::TransferIn => {
                    // Impossible by construction: the OUT leg always expires before or
                    // alongside its IN partner, so the IN leg should never still be PENDING
                    // here on its own. Flagged for investigation, never panics.
                    error!(
                        transaction_id = %row.id(),
                        reference = row.reference(),
                        "transfer_in leg surfaced as a driving row in the expiry scan without its out leg; skipping"
                    );
                    continue;
                }
                TransactionType::Withdrawal => self.expire_cash_out(&row).await,
                TransactionType::Deposit => {
                    error!(transaction_id = %row.id(), "deposit row unexpectedly pending past expiry; deposits never carry an expiry_time, skipping");
                    continue;
                }
            };

            match outcome {
                Ok(()) => expired += 1,
                Err(err) => error!(transaction_id = %row.id(), error = %err, "failed to expire transaction, will retry next run"),
            }
        }

        expired
    }

    async fn expire_transfer(&self, out_leg: &Transaction) -> Result<(), EngineError> {
        let (in_leg, out_leg) = self
            .transaction_repo
            .find_transfer_legs(out_leg.reference())
            .await?;

        let mut unit = self.atomic_units.begin().await?;
        unit.lock_wallet(out_leg.wallet_id()).await?;
        unit.apply_delta(out_leg.wallet_id(), out_leg.amount()).await?;
        unit.update_status(out_leg.id(), TransactionStatus::Expired).await?;
        unit.update_status(in_leg.id(), TransactionStatus::Expired).await?;
        unit.commit().await?;

        self.cache.invalidate_wallet(out_leg.wallet_id());
        self.cache.invalidate_wallet(in_leg.wallet_id());

        if let Ok(sender) = self.wallet_repo.find_by_id(out_leg.wallet_id()).await {
            self.notifications
                .publish(NotificationEvent {
                    kind: NotificationKind::TransferExpired,
                    transaction_id: out_leg.id(),
                    wallet_id: out_leg.wallet_id(),
                    related_wallet_id: Some(in_leg.wallet_id()),
                    user_id: sender.owner_user_id(),
                    amount: out_leg.amount(),
                    transaction_type: TransactionType::TransferOut,
                    reference: out_leg.reference().to_string(),
                    created_at: out_leg.created_at(),
                })
                .await;
        }
        if let Ok(recipient) = self.wallet_repo.find_by_id(in_leg.wallet_id()).await {
            self.notifications
                .publish(NotificationEvent {
                    kind: NotificationKind::TransferExpired,
                    transaction_id: in_leg.id(),
                    wallet_id: in_leg.wallet_id(),
                    related_wallet_id: Some(out_leg.wallet_id()),
                    user_id: recipient.owner_user_id(),
                    amount: in_leg.amount(),
                    transaction_type: TransactionType::TransferIn,
                    reference: in_leg.reference().to_string(),
                    created_at: in_leg.created_at(),
                })
                .await;
        }

        Ok(())
    }

    async fn expire_cash_out(&self, transaction: &Transaction) -> Result<(), EngineError> {
        let mut unit = self.atomic_units.begin().await?;
        unit.update_status(transaction.id(), TransactionStatus::Expired).await?;
        unit.commit().await?;

        self.cache.invalidate_wallet(transaction.wallet_id());

        if let Ok(wallet) = self.wallet_repo.find_by_id(transaction.wallet_id()).await {
            self.notifications
                .publish(NotificationEvent {
                    kind: NotificationKind::CashOutExpired,
                    transaction_id: transaction.id(),
                    wallet_id: transaction.wallet_id(),
                    related_wallet_id: None,
                    user_id: wallet.owner_user_id(),
                    amount: transaction.amount(),
                    transaction_type: TransactionType::Withdrawal,
                    reference: transaction.reference().to_string(),
                    created_at: transaction.created_at(),
                })
                .await;
        }

        Ok(())
    }
}
