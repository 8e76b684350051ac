use std::net::IpAddr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::directory::UserDirectory;
use crate::domain::entities::{Transaction, Wallet};
use crate::domain::error::EngineError;
use crate::domain::notification::NotificationSink;
use crate::domain::repository::{
    AtomicUnitFactory, IdempotencyStore, TransactionPage, TransactionRepository, WalletRepository,
};
use crate::domain::types::{Currency, TransactionId, TransferAction, UserId, WalletId};
use crate::infrastructure::cache::transaction_list_cache::TransactionListCache;
use crate::use_cases::cash_out_request::{CashOutRequestOutcome, CashOutRequestUseCase};
use crate::use_cases::cash_out_verify::{CashOutVerifyOutcome, CashOutVerifyUseCase};
use crate::use_cases::create_wallet::CreateWalletUseCase;
use crate::use_cases::deposit::DepositUseCase;
use crate::use_cases::get_transaction::GetTransactionUseCase;
use crate::use_cases::ingest_deposit_webhook::{IngestDepositWebhookUseCase, WebhookOutcome};
use crate::use_cases::list_transactions::ListTransactionsUseCase;
use crate::use_cases::process_action::ProcessActionUseCase;
use crate::use_cases::transfer::{TransferOutcome, TransferUseCase};
use crate::use_cases::withdrawal::WithdrawalUseCase;

/// Tunables that don't belong to any single use case but shape several of them. Mirrors the
/// environment-driven knobs in [`crate::config::Config`] one-to-one.
pub struct EngineConfig {
    pub cash_out_expiry_minutes: i64,
    pub transfer_expiry_hours: i64,
    pub paysend_webhook_secret: String,
    pub webhook_ip_whitelist: Vec<IpAddr>,
}

/// The process-wide command/query surface. Built once at startup and shared behind an `Arc`;
/// the HTTP layer (and the expiry worker) hold this instead of any individual repository, so a
/// caller never has to know which atomic unit or repository backs a given operation.
pub struct WalletEngine {
    create_wallet: CreateWalletUseCase,
    deposit: Arc<DepositUseCase>,
    withdrawal: WithdrawalUseCase,
    transfer: TransferUseCase,
    process_action: ProcessActionUseCase,
    cash_out_request: CashOutRequestUseCase,
    cash_out_verify: CashOutVerifyUseCase,
    ingest_deposit_webhook: IngestDepositWebhookUseCase,
    list_transactions: ListTransactionsUseCase,
    get_transaction: GetTransactionUseCase,
    directory: Arc<dyn UserDirectory>,
    wallet_repo: Arc<dyn WalletRepository>,
}

impl WalletEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        transaction_repo: Arc<dyn TransactionRepository>,
        atomic_units: Arc<dyn AtomicUnitFactory>,
        idempotency: Arc<dyn IdempotencyStore>,
        directory: Arc<dyn UserDirectory>,
        notifications: Arc<dyn NotificationSink>,
        cache: Arc<TransactionListCache>,
        config: EngineConfig,
    ) -> Self {
        let deposit = Arc::new(DepositUseCase::new(
            wallet_repo.clone(),
            atomic_units.clone(),
            notifications.clone(),
            cache.clone(),
        ));

        Self {
            create_wallet: CreateWalletUseCase::new(wallet_repo.clone()),
            deposit: deposit.clone(),
            withdrawal: WithdrawalUseCase::new(
                wallet_repo.clone(),
                atomic_units.clone(),
                notifications.clone(),
                cache.clone(),
            ),
            transfer: TransferUseCase::new(
                wallet_repo.clone(),
                directory.clone(),
                atomic_units.clone(),
                notifications.clone(),
                cache.clone(),
                config.transfer_expiry_hours,
            ),
            process_action: ProcessActionUseCase::new(
                transaction_repo.clone(),
                wallet_repo.clone(),
                atomic_units.clone(),
                notifications.clone(),
                cache.clone(),
            ),
            cash_out_request: CashOutRequestUseCase::new(
                wallet_repo.clone(),
                atomic_units.clone(),
                notifications.clone(),
                cache.clone(),
                config.cash_out_expiry_minutes,
            ),
            cash_out_verify: CashOutVerifyUseCase::new(
                atomic_units.clone(),
                notifications.clone(),
                cache.clone(),
                idempotency.clone(),
            ),
            ingest_deposit_webhook: IngestDepositWebhookUseCase::new(
                deposit,
                idempotency,
                config.paysend_webhook_secret,
                config.webhook_ip_whitelist,
            ),
            list_transactions: ListTransactionsUseCase::new(
                wallet_repo.clone(),
                transaction_repo.clone(),
                cache,
            ),
            get_transaction: GetTransactionUseCase::new(wallet_repo.clone(), transaction_repo),
            directory,
            wallet_repo,
        }
    }

    #[tracing::instrument(name = "WalletEngine::create_wallet", skip(self))]
    pub async fn create_wallet(
        &self,
        owner_user_id: UserId,
        phone_number: &str,
        currency: Currency,
    ) -> Result<Wallet, EngineError> {
        self.create_wallet.execute(owner_user_id, phone_number, currency).await
    }

    /// Immediate, non-ATM debit. Not part of the HTTP-facing command set in the external
    /// interfaces table; exposed here for internal/administrative callers only.
    #[tracing::instrument(name = "WalletEngine::withdrawal", skip(self))]
    pub async fn withdrawal(
        &self,
        owner_user_id: UserId,
        amount: Decimal,
        reference: String,
    ) -> Result<Transaction, EngineError> {
        self.withdrawal.execute(owner_user_id, amount, reference).await
    }

    #[tracing::instrument(name = "WalletEngine::transfer", skip(self))]
    pub async fn transfer(
        &self,
        sender_user_id: UserId,
        recipient_username: &str,
        amount: Decimal,
    ) -> Result<TransferOutcome, EngineError> {
        self.transfer.execute(sender_user_id, recipient_username, amount).await
    }

    #[tracing::instrument(name = "WalletEngine::process_action", skip(self))]
    pub async fn process_action(
        &self,
        caller_user_id: UserId,
        caller_wallet_id: WalletId,
        reference: &str,
        action: TransferAction,
    ) -> Result<(), EngineError> {
        self.process_action
            .execute(caller_user_id, caller_wallet_id, reference, action)
            .await
    }

    #[tracing::instrument(name = "WalletEngine::cash_out_request", skip(self))]
    pub async fn cash_out_request(
        &self,
        owner_user_id: UserId,
        amount: Decimal,
    ) -> Result<CashOutRequestOutcome, EngineError> {
        self.cash_out_request.execute(owner_user_id, amount).await
    }

    #[tracing::instrument(name = "WalletEngine::cash_out_verify", skip(self))]
    pub async fn cash_out_verify(
        &self,
        phone_number: &str,
        withdrawal_code: &str,
        idempotency_key: &str,
    ) -> Result<CashOutVerifyOutcome, EngineError> {
        self.cash_out_verify
            .execute(phone_number, withdrawal_code, idempotency_key)
            .await
    }

    #[tracing::instrument(name = "WalletEngine::ingest_deposit_webhook", skip(self, raw_body))]
    pub async fn ingest_deposit_webhook(
        &self,
        source_ip: IpAddr,
        signature_header: &str,
        idempotency_key: &str,
        raw_body: &[u8],
    ) -> Result<WebhookOutcome, EngineError> {
        self.ingest_deposit_webhook
            .execute(source_ip, signature_header, idempotency_key, raw_body)
            .await
    }

    #[tracing::instrument(name = "WalletEngine::list_transactions", skip(self))]
    pub async fn list_transactions(
        &self,
        owner_user_id: UserId,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage, EngineError> {
        self.list_transactions.execute(owner_user_id, page, page_size).await
    }

    #[tracing::instrument(name = "WalletEngine::get_transaction", skip(self))]
    pub async fn get_transaction(
        &self,
        caller_user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Transaction, EngineError> {
        self.get_transaction.execute(caller_user_id, transaction_id).await
    }

    /// Reacts to the identity collaborator's "user created" signal; not HTTP-facing.
    #[tracing::instrument(name = "WalletEngine::on_user_provisioned", skip(self))]
    pub async fn on_user_provisioned(
        &self,
        user_id: UserId,
        phone_number: &str,
        is_staff: bool,
        currency: Currency,
    ) -> Result<(), EngineError> {
        self.create_wallet
            .on_user_provisioned(user_id, phone_number, is_staff, currency)
            .await
    }

    #[tracing::instrument(name = "WalletEngine::resolve_username", skip(self))]
    pub async fn resolve_username(&self, username: &str) -> Result<UserId, EngineError> {
        self.directory.resolve_username(username).await
    }

    /// Resolves a caller's own wallet id, for endpoints (like `ProcessAction`) that need it to
    /// re-verify ownership but only receive a `UserId` from the auth layer.
    #[tracing::instrument(name = "WalletEngine::resolve_owned_wallet", skip(self))]
    pub async fn resolve_owned_wallet(&self, owner_user_id: UserId) -> Result<WalletId, EngineError> {
        self.wallet_repo
            .find_by_owner(owner_user_id)
            .await
            .map(|wallet| wallet.id())
    }
}
