use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entities::Transaction;
use crate::domain::error::EngineError;
use crate::domain::notification::{NotificationEvent, NotificationKind, NotificationSink};
use crate::domain::repository::{AtomicUnitFactory, IdempotencyStore};
use crate::domain::types::{TransactionStatus, TransactionType};
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;
use crate::support::{decode_outcome, encode_outcome};

const IDEMPOTENCY_SCOPE: &str = "cash-out-verify";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashOutVerifyOutcome {
    pub amount: Decimal,
    pub transaction_id: crate::domain::types::TransactionId,
}

/// Invoked by the ATM collaborator once it has already confirmed the caller's source IP is in
/// the configured whitelist (checked one layer up, in the webhook/ingress adapter — this use
/// case only knows about the phone number and code). Wrapped in the same claim-then-fill
/// idempotency discipline as the deposit webhook, since a retried ATM redemption must not debit
/// the wallet twice.
pub struct CashOutVerifyUseCase {
    atomic_units: Arc<dyn AtomicUnitFactory>,
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<TransactionListCache>,
    idempotency: Arc<dyn IdempotencyStore>,
}

impl CashOutVerifyUseCase {
    pub fn new(
        atomic_units: Arc<dyn AtomicUnitFactory>,
        notifications: Arc<dyn NotificationSink>,
        cache: Arc<TransactionListCache>,
        idempotency: Arc<dyn IdempotencyStore>,
    ) -> Self {
        Self {
            atomic_units,
            notifications,
            cache,
            idempotency,
        }
    }

    #[tracing::instrument(name = "CashOutVerifyUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        phone_number: &str,
        withdrawal_code: &str,
        idempotency_key: &str,
    ) -> Result<CashOutVerifyOutcome, EngineError> {
        if let Some(stored) = self
            .idempotency
            .fetch_response(IDEMPOTENCY_SCOPE, idempotency_key)
            .await?
        {
            return decode_outcome(&stored);
        }
        let claimed = self
            .idempotency
            .try_claim(IDEMPOTENCY_SCOPE, idempotency_key)
            .await?;
        if !claimed {
            // Lost the claim race; the winner is still processing. Mirrors the same tradeoff
            // as the deposit webhook: the caller's retry will observe the stored response once
            // it lands, rather than this call blocking on it.
            return Err(EngineError::Internal(
                "idempotency key is being processed by a concurrent request".into(),
            ));
        }

        let outcome = self.verify(phone_number, withdrawal_code).await;

        // Persist whichever branch we got, not only success — otherwise a terminal failure
        // (InvalidCode, Expired, InsufficientFunds, ...) leaves the key claimed forever with
        // no response ever recorded against it, and every retry misreports as "in progress".
        if let Ok(serialized) = encode_outcome(&outcome) {
            let _ = self
                .idempotency
                .store_response(IDEMPOTENCY_SCOPE, idempotency_key, &serialized)
                .await;
        }

        outcome
    }

    async fn verify(
        &self,
        phone_number: &str,
        withdrawal_code: &str,
    ) -> Result<CashOutVerifyOutcome, EngineError> {
        let mut unit = self.atomic_units.begin().await?;

        let Some((transaction, locked_wallet)) = unit
            .lock_pending_cash_out(phone_number, withdrawal_code)
            .await?
        else {
            return Err(EngineError::InvalidCode);
        };

        if transaction.expiry_time().is_some_and(|expiry| Utc::now() > expiry) {
            unit.update_status(transaction.id(), TransactionStatus::Expired).await?;
            unit.commit().await?;
            self.cache.invalidate_wallet(locked_wallet.wallet.id());
            return Err(EngineError::Expired);
        }

        if locked_wallet.wallet.balance() < transaction.amount() {
            unit.update_status(transaction.id(), TransactionStatus::Failed).await?;
            unit.commit().await?;
            self.cache.invalidate_wallet(locked_wallet.wallet.id());
            return Err(EngineError::InsufficientFunds(locked_wallet.wallet.id()));
        }

        unit.apply_delta(locked_wallet.wallet.id(), -transaction.amount())
            .await?;
        unit.update_status(transaction.id(), TransactionStatus::Completed).await?;
        unit.commit().await?;
        self.cache.invalidate_wallet(locked_wallet.wallet.id());

        self.notifications
            .publish(NotificationEvent {
                kind: NotificationKind::CashOutVerified,
                transaction_id: transaction.id(),
                wallet_id: transaction.wallet_id(),
                related_wallet_id: None,
                user_id: locked_wallet.wallet.owner_user_id(),
                amount: transaction.amount(),
                transaction_type: TransactionType::Withdrawal,
                reference: transaction.reference().to_string(),
                created_at: transaction.created_at(),
            })
            .await;

        Ok(CashOutVerifyOutcome {
            amount: transaction.amount(),
            transaction_id: transaction.id(),
        })
    }
}
