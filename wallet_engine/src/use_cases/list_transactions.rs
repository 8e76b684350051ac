use std::sync::Arc;

use crate::domain::error::EngineError;
use crate::domain::repository::{TransactionPage, TransactionRepository, WalletRepository};
use crate::domain::types::UserId;
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;

/// Cached, paginated listing of one user's transactions. The cache is a read-through layer in
/// front of the repository; callers never see the difference between a hit and a miss.
pub struct ListTransactionsUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    transaction_repo: Arc<dyn TransactionRepository>,
    cache: Arc<TransactionListCache>,
}

impl ListTransactionsUseCase {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        transaction_repo: Arc<dyn TransactionRepository>,
        cache: Arc<TransactionListCache>,
    ) -> Self {
        Self {
            wallet_repo,
            transaction_repo,
            cache,
        }
    }

    #[tracing::instrument(name = "ListTransactionsUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        owner_user_id: UserId,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage, EngineError> {
        let wallet = self.wallet_repo.find_by_owner(owner_user_id).await?;

        if let Some(cached) = self.cache.get(wallet.id(), page, page_size) {
            return Ok(cached);
        }

        let offset = page.saturating_sub(1).max(0) * page_size;
        let result = self
            .transaction_repo
            .list_for_wallet(wallet.id(), page_size, offset)
            .await?;

        self.cache.put(wallet.id(), page, page_size, result.clone());

        Ok(result)
    }
}
