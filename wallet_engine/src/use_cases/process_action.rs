use std::sync::Arc;

use crate::domain::entities::Transaction;
use crate::domain::error::EngineError;
use crate::domain::notification::{NotificationEvent, NotificationKind, NotificationSink};
use crate::domain::repository::{AtomicUnitFactory, TransactionRepository, WalletRepository};
use crate::domain::types::{TransactionStatus, TransferAction, UserId, WalletId};
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;

/// Recipient's acknowledgement of a pending transfer. Looks both legs up by their shared
/// reference so the atomic unit that follows can act on the matched pair without a second
/// round trip.
pub struct ProcessActionUseCase {
    transaction_repo: Arc<dyn TransactionRepository>,
    wallet_repo: Arc<dyn WalletRepository>,
    atomic_units: Arc<dyn AtomicUnitFactory>,
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<TransactionListCache>,
}

impl ProcessActionUseCase {
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

    #[tracing::instrument(name = "ProcessActionUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        caller_user_id: UserId,
        caller_wallet_id: WalletId,
        reference: &str,
        action: TransferAction,
    ) -> Result<(), EngineError> {
        let (in_leg, out_leg) = self.find_legs(reference).await?;

        if in_leg.wallet_id() != caller_wallet_id {
            return Err(EngineError::NotOwner(in_leg.id()));
        }
        if in_leg.status() != TransactionStatus::Pending || out_leg.status() != TransactionStatus::Pending {
            return Err(EngineError::NotFound);
        }

        match action {
            TransferAction::Accept => self.accept(&in_leg, &out_leg).await?,
            TransferAction::Reject => self.reject(&in_leg, &out_leg).await?,
        }
        self.cache.invalidate_wallet(in_leg.wallet_id());
        self.cache.invalidate_wallet(out_leg.wallet_id());

        let kind = match action {
            TransferAction::Accept => NotificationKind::TransferAccepted,
            TransferAction::Reject => NotificationKind::TransferRejected,
        };
        // The caller already proved ownership of the in-leg above, so its user_id is known
        // without a lookup. The out-leg belongs to the other party to the transfer and must be
        // resolved through its wallet, the same way the expiry worker does for the analogous
        // expired-transfer notification.
        self.notifications
            .publish(NotificationEvent {
                kind,
                transaction_id: in_leg.id(),
                wallet_id: in_leg.wallet_id(),
                related_wallet_id: in_leg.related_wallet_id(),
                user_id: caller_user_id,
                amount: in_leg.amount(),
                transaction_type: in_leg.transaction_type(),
                reference: in_leg.reference().to_string(),
                created_at: in_leg.created_at(),
            })
            .await;

        if let Ok(sender) = self.wallet_repo.find_by_id(out_leg.wallet_id()).await {
            self.notifications
                .publish(NotificationEvent {
                    kind,
                    transaction_id: out_leg.id(),
                    wallet_id: out_leg.wallet_id(),
                    related_wallet_id: out_leg.related_wallet_id(),
                    user_id: sender.owner_user_id(),
                    amount: out_leg.amount(),
                    transaction_type: out_leg.transaction_type(),
                    reference: out_leg.reference().to_string(),
                    created_at: out_leg.created_at(),
                })
                .await;
        }

        Ok(())
    }

    async fn find_legs(&self, reference: &str) -> Result<(Transaction, Transaction), EngineError> {
        self.transaction_repo.find_transfer_legs(reference).await
    }

    async fn accept(&self, in_leg: &Transaction, out_leg: &Transaction) -> Result<(), EngineError> {
        let mut unit = self.atomic_units.begin().await?;
        unit.lock_wallet(in_leg.wallet_id()).await?;
        unit.apply_delta(in_leg.wallet_id(), in_leg.amount()).await?;
        unit.update_status(in_leg.id(), TransactionStatus::Completed).await?;
        unit.update_status(out_leg.id(), TransactionStatus::Completed).await?;
        unit.commit().await?;
        Ok(())
    }

    async fn reject(&self, in_leg: &Transaction, out_leg: &Transaction) -> Result<(), EngineError> {
        let mut unit = self.atomic_units.begin().await?;
        unit.lock_wallet(out_leg.wallet_id()).await?;
        unit.apply_delta(out_leg.wallet_id(), out_leg.amount()).await?;
        unit.update_status(in_leg.id(), TransactionStatus::Rejected).await?;
        unit.update_status(out_leg.id(), TransactionStatus::Rejected).await?;
        unit.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Transaction as Txn, Wallet};
    use crate::domain::repository::{
        AtomicUnit, LockedWallet, MockAtomicUnitFactory, MockTransactionRepository, MockWalletRepository,
    };
    use crate::domain::types::{Currency, TransactionId, TransactionType, WalletId as Wid};
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    struct NullSink;
    #[async_trait]
    impl NotificationSink for NullSink {
        async fn publish(&self, _event: NotificationEvent) {}
    }

    struct CapturingSink(Mutex<Vec<NotificationEvent>>);
    #[async_trait]
    impl NotificationSink for CapturingSink {
        async fn publish(&self, event: NotificationEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn wallet(id: Wid, owner: UserId) -> Wallet {
        Wallet::reconstitute(
            id,
            owner,
            Decimal::ZERO,
            Currency::Usd,
            format!("961{}", &id.to_string()[..8]),
            true,
            Utc::now(),
            Utc::now(),
        )
    }

    mock! {
        pub Unit {}

        #[async_trait]
        impl AtomicUnit for Unit {
            async fn lock_wallet(&mut self, id: Wid) -> Result<LockedWallet, EngineError>;
            async fn apply_delta(&mut self, id: Wid, delta: Decimal) -> Result<(), EngineError>;
            async fn insert_transaction(&mut self, transaction: &Txn) -> Result<(), EngineError>;
            async fn update_status(&mut self, id: TransactionId, status: TransactionStatus) -> Result<(), EngineError>;
            async fn lock_pending_cash_out(&mut self, phone_number: &str, code: &str) -> Result<Option<(Txn, LockedWallet)>, EngineError>;
            async fn commit(self: Box<Self>) -> Result<(), EngineError>;
        }
    }

    fn leg(wallet_id: Wid, related: Wid, ty: TransactionType, reference: &str) -> Txn {
        Txn::new(
            wallet_id,
            Some(related),
            Decimal::new(10000, 2),
            ty,
            None,
            reference.to_string(),
            TransactionStatus::Pending,
            Some(Utc::now() + chrono::Duration::hours(1)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_when_caller_does_not_own_the_in_leg() {
        let sender = Wid::new();
        let recipient = Wid::new();
        let in_leg = leg(recipient, sender, TransactionType::TransferIn, "TRANSFER-ABCDEF01");
        let out_leg = leg(sender, recipient, TransactionType::TransferOut, "TRANSFER-ABCDEF01");

        let mut repo = MockTransactionRepository::new();
        repo.expect_find_transfer_legs()
            .returning(move |_| Ok((in_leg.clone(), out_leg.clone())));

        let use_case = ProcessActionUseCase::new(
            Arc::new(repo),
            Arc::new(MockWalletRepository::new()),
            Arc::new(MockAtomicUnitFactory::new()),
            Arc::new(NullSink),
            Arc::new(TransactionListCache::new(std::time::Duration::from_secs(900))),
        );

        let result = use_case
            .execute(UserId::new(), sender, "TRANSFER-ABCDEF01", TransferAction::Accept)
            .await;

        assert!(matches!(result, Err(EngineError::NotOwner(_))));
    }

    #[tokio::test]
    async fn notifies_each_party_with_their_own_user_id() {
        let sender_wallet = Wid::new();
        let recipient_wallet = Wid::new();
        let sender_user = UserId::new();
        let recipient_user = UserId::new();

        let in_leg = leg(recipient_wallet, sender_wallet, TransactionType::TransferIn, "TRANSFER-ABCDEF02");
        let out_leg = leg(sender_wallet, recipient_wallet, TransactionType::TransferOut, "TRANSFER-ABCDEF02");

        let mut repo = MockTransactionRepository::new();
        repo.expect_find_transfer_legs()
            .returning(move |_| Ok((in_leg.clone(), out_leg.clone())));

        let mut wallet_repo = MockWalletRepository::new();
        wallet_repo
            .expect_find_by_id()
            .returning(move |id| {
                if id == sender_wallet {
                    Ok(wallet(sender_wallet, sender_user))
                } else {
                    Ok(wallet(recipient_wallet, recipient_user))
                }
            });

        let mut atomic_units = MockAtomicUnitFactory::new();
        atomic_units.expect_begin().times(1).returning(|| {
            let mut unit = MockUnit::new();
            unit.expect_lock_wallet()
                .returning(move |id| Ok(LockedWallet { wallet: wallet(id, UserId::new()) }));
            unit.expect_apply_delta().returning(|_, _| Ok(()));
            unit.expect_update_status().returning(|_, _| Ok(()));
            unit.expect_commit().returning(|| Ok(()));
            Ok(Box::new(unit) as Box<dyn AtomicUnit>)
        });

        let sink = Arc::new(CapturingSink(Mutex::new(Vec::new())));

        let use_case = ProcessActionUseCase::new(
            Arc::new(repo),
            Arc::new(wallet_repo),
            Arc::new(atomic_units),
            sink.clone(),
            Arc::new(TransactionListCache::new(std::time::Duration::from_secs(900))),
        );

        use_case
            .execute(recipient_user, recipient_wallet, "TRANSFER-ABCDEF02", TransferAction::Accept)
            .await
            .unwrap();

        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 2);

        let in_event = events.iter().find(|e| e.wallet_id == recipient_wallet).unwrap();
        assert_eq!(in_event.user_id, recipient_user);

        let out_event = events.iter().find(|e| e.wallet_id == sender_wallet).unwrap();
        assert_eq!(out_event.user_id, sender_user);
    }
}
