use std::sync::Arc;

use crate::domain::entities::Transaction;
use crate::domain::error::EngineError;
use crate::domain::repository::{TransactionRepository, WalletRepository};
use crate::domain::types::{TransactionId, UserId};

/// Fetches a single transaction, re-verifying that the caller is either the subject or the
/// counterparty of the leg — a row id alone doesn't prove ownership.
pub struct GetTransactionUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    transaction_repo: Arc<dyn TransactionRepository>,
}

impl GetTransactionUseCase {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        transaction_repo: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            wallet_repo,
            transaction_repo,
        }
    }

    #[tracing::instrument(name = "GetTransactionUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        caller_user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Transaction, EngineError> {
        let transaction = self.transaction_repo.find_by_id(transaction_id).await?;
        let caller_wallet = self.wallet_repo.find_by_owner(caller_user_id).await?;

        let is_subject = transaction.wallet_id() == caller_wallet.id();
        let is_counterparty = transaction.related_wallet_id() == Some(caller_wallet.id());

        if !is_subject && !is_counterparty {
            return Err(EngineError::Forbidden);
        }

        Ok(transaction)
    }
}
