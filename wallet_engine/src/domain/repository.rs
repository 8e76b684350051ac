use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{Transaction, Wallet};
use crate::domain::error::EngineError;
use crate::domain::types::{TransactionId, TransactionStatus, UserId, WalletId};

/// A page of transactions for one wallet, newest first.
#[derive(Clone, Serialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total: i64,
}

/// Persistence port for wallets. Balance mutation is deliberately not exposed here: any change
/// to `balance` happens inside an atomic unit (see [`AtomicUnit`]) so the caller can combine it
/// with transaction inserts under a single set of row locks.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait WalletRepository: Send + Sync {
    /// Idempotent: returns the owner's existing wallet if one is already bound, otherwise
    /// creates one. Fails with `DuplicatePhone` if `phone_number` is already bound to a
    /// *different* owner.
    async fn get_or_create(
        &self,
        owner_user_id: UserId,
        phone_number: &str,
        currency: crate::domain::types::Currency,
    ) -> Result<Wallet, EngineError>;

    async fn find_by_id(&self, id: WalletId) -> Result<Wallet, EngineError>;
    async fn find_by_owner(&self, owner_user_id: UserId) -> Result<Wallet, EngineError>;
    async fn find_by_phone(&self, phone_number: &str) -> Result<Wallet, EngineError>;
}

/// Persistence port for transaction rows.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: TransactionId) -> Result<Transaction, EngineError>;

    /// Returns the `(TRANSFER_IN, TRANSFER_OUT)` pair sharing `reference`. `NotFound` if either
    /// leg is missing — the two are always written together (invariant T1), so a missing
    /// partner means `reference` doesn't denote a transfer at all.
    async fn find_transfer_legs(
        &self,
        reference: &str,
    ) -> Result<(Transaction, Transaction), EngineError>;

    async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<TransactionPage, EngineError>;
    async fn find_pending_past_expiry(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, EngineError>;
}

/// One wallet's lock-and-balance-mutation within an [`AtomicUnit`]. Returned by
/// `AtomicUnit::lock_wallet` so callers read the pre-mutation balance before deciding how much
/// to apply (e.g. to check sufficient funds).
pub struct LockedWallet {
    pub wallet: Wallet,
}

/// A single all-or-nothing unit of work spanning wallet balance changes and transaction row
/// writes. Implemented over one `sqlx::Transaction` so every lock taken and every row written
/// inside it becomes visible atomically on `commit`, or vanishes entirely on drop without a
/// commit.
///
/// Callers must acquire wallet locks in ascending `WalletId` order (see
/// [`crate::domain::types::WalletId`]'s `Ord` impl) whenever more than one wallet participates,
/// to avoid deadlocking against a concurrent unit taking the same two locks in the other order.
#[async_trait]
pub trait AtomicUnit: Send {
    /// Takes a row lock (`SELECT ... FOR UPDATE`) on the wallet and returns its current state.
    async fn lock_wallet(&mut self, id: WalletId) -> Result<LockedWallet, EngineError>;

    /// Applies `delta` (positive credits, negative debits) to the locked wallet's balance.
    /// The database's non-negative check constraint is the last line of defense against a
    /// caller applying a debit it failed to validate against the locked balance first.
    async fn apply_delta(&mut self, id: WalletId, delta: rust_decimal::Decimal) -> Result<(), EngineError>;

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), EngineError>;

    async fn update_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<(), EngineError>;

    /// Locates the unique PENDING cash-out transaction whose reference ends with `code` and
    /// whose owning wallet's phone number is `phone_number`, and locks both the row and its
    /// wallet. `None` if no such PENDING transaction exists (caller reports `InvalidCode`).
    async fn lock_pending_cash_out(
        &mut self,
        phone_number: &str,
        code: &str,
    ) -> Result<Option<(Transaction, LockedWallet)>, EngineError>;

    async fn commit(self: Box<Self>) -> Result<(), EngineError>;
}

/// Opens new atomic units. The one seam every use case that mutates balances goes through.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AtomicUnitFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>, EngineError>;
}

/// Claim-then-fill idempotency store, one row per `(scope, key)`. `try_claim` is the only
/// compare-and-set: it succeeds for the first caller and fails for every concurrent or later
/// retry, which then falls through to `fetch_response`.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait IdempotencyStore: Send + Sync {
    /// Attempts to claim `key` within `scope`. Returns `true` if this call made the claim,
    /// `false` if another caller already holds it.
    async fn try_claim(&self, scope: &str, key: &str) -> Result<bool, EngineError>;

    /// Records the response body to serve to replays of `key`, and releases callers blocked
    /// behind `fetch_response` waiting on this claim to resolve.
    async fn store_response(&self, scope: &str, key: &str, response: &str) -> Result<(), EngineError>;

    /// Returns the stored response for a previously claimed key, or `None` if the original
    /// caller has not finished (or never stored one — a bug, not a legitimate race, since every
    /// code path that claims a key must eventually store a response).
    async fn fetch_response(&self, scope: &str, key: &str) -> Result<Option<String>, EngineError>;
}
